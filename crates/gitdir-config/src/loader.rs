//! Rebuilding a [`Configuration`] from object hashes.
//!
//! The loader never looks at a working tree. Each scope is a commit id in
//! the scope's config repository; the loader reads the commit, its root tree
//! and the files below it straight from the [`ObjectStore`], so a pushed
//! commit can be checked before any branch points at it.

use std::collections::BTreeMap;

use gitdir_crypto::PublicKey;
use gitdir_refs::RefStore;
use gitdir_store::{EntryMode, ObjectStore, Tree};
use gitdir_types::{validate_name, ObjectId, TypeError};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult, Scope};
use crate::file::{key_lines, AdminFile, OrgFile};
use crate::layout::Layout;
use crate::model::{Configuration, Organization, RepoRule, User};
use crate::pattern::Pattern;

/// Per-scope hash overrides, keyed by organization or user name.
pub type HashOverrides = BTreeMap<String, ObjectId>;

/// Loads configurations through an object store and a ref store.
pub struct ConfigLoader<'a> {
    objects: &'a dyn ObjectStore,
    refs: &'a dyn RefStore,
    layout: Layout,
}

impl<'a> ConfigLoader<'a> {
    /// A loader using the default [`Layout`].
    pub fn new(objects: &'a dyn ObjectStore, refs: &'a dyn RefStore) -> Self {
        Self {
            objects,
            refs,
            layout: Layout::default(),
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The committed configuration hash of a scope's repository, zero if
    /// the configuration branch does not exist.
    pub fn current_hash(&self, scope: &Scope) -> ConfigResult<ObjectId> {
        self.refs
            .resolve(&self.scope_repo(scope), &self.layout.branch)
            .map_err(|source| ConfigError::Ref {
                scope: scope.clone(),
                source,
            })
    }

    /// The config repository a scope is read from.
    pub fn scope_repo(&self, scope: &Scope) -> String {
        match scope {
            Scope::Admin => self.layout.admin_repo.clone(),
            Scope::Org(name) => self.layout.org_repo(name),
            Scope::User(name) => self.layout.user_repo(name),
        }
    }

    pub fn current_admin_hash(&self) -> ConfigResult<ObjectId> {
        self.current_hash(&Scope::Admin)
    }

    /// Load every scope at its current committed hash.
    pub fn load_current(&self) -> ConfigResult<Configuration> {
        self.load(
            self.current_admin_hash()?,
            &HashOverrides::new(),
            &HashOverrides::new(),
        )
    }

    /// Load the configuration rooted at the admin commit `admin`.
    ///
    /// Organizations and users declared by the admin scope are loaded at the
    /// hash given in `orgs` / `users`, or at their current committed hash if
    /// not overridden. A zero hash means the scope is absent.
    pub fn load(
        &self,
        admin: ObjectId,
        orgs: &HashOverrides,
        users: &HashOverrides,
    ) -> ConfigResult<Configuration> {
        let admin_file: AdminFile = if admin.is_zero() {
            AdminFile::default()
        } else {
            let tree = self.root_tree(&Scope::Admin, admin)?;
            self.read_toml(&Scope::Admin, &tree)?
        };

        let mut config = Configuration::empty(self.layout.clone());
        config.options = admin_file.options;
        config.hashes.admin = admin;
        config.admins.extend(admin_file.admins);

        for (name, entry) in admin_file.users {
            self.check_name(&Scope::Admin, &name)?;
            let mut user = User::new(&name);
            for (i, line) in entry.keys.iter().enumerate() {
                let key = PublicKey::parse_authorized_key(line).map_err(|e| ConfigError::Parse {
                    scope: Scope::Admin,
                    path: format!("{}: users.{name}.keys[{i}]", self.layout.config_file),
                    message: e.to_string(),
                })?;
                user.add_key(key);
            }
            config.users.insert(name, user);
        }

        for (name, entry) in admin_file.orgs {
            self.check_name(&Scope::Admin, &name)?;
            let mut org = Organization::new(&name);
            org.admins.extend(entry.admins);
            org.members.extend(entry.members);
            config.orgs.insert(name, org);
        }

        reject_undeclared(orgs, |name| config.orgs.contains_key(name), "organization")?;
        reject_undeclared(users, |name| config.users.contains_key(name), "user")?;

        for org in config.orgs.values_mut() {
            let hash = match orgs.get(&org.name) {
                Some(hash) => *hash,
                None => self.current_hash(&Scope::Org(org.name.clone()))?,
            };
            if hash.is_zero() {
                continue;
            }
            self.load_org(org, hash)?;
            config.hashes.orgs.insert(org.name.clone(), hash);
        }

        for user in config.users.values_mut() {
            let hash = match users.get(&user.name) {
                Some(hash) => *hash,
                None => self.current_hash(&Scope::User(user.name.clone()))?,
            };
            if hash.is_zero() {
                continue;
            }
            self.load_user(user, hash)?;
            config.hashes.users.insert(user.name.clone(), hash);
        }

        for admin in &config.admins {
            if !config.users.contains_key(admin) {
                return Err(ConfigError::Dangling {
                    scope: Scope::Admin,
                    kind: "user",
                    name: admin.clone(),
                });
            }
        }
        for org in config.orgs.values() {
            for name in org.admins.iter().chain(&org.members) {
                match config.users.get_mut(name) {
                    Some(user) => {
                        user.orgs.insert(org.name.clone());
                    }
                    None => {
                        return Err(ConfigError::Dangling {
                            scope: Scope::Org(org.name.clone()),
                            kind: "user",
                            name: name.clone(),
                        });
                    }
                }
            }
        }

        debug!(
            admin = %admin.short_hex(),
            orgs = config.orgs.len(),
            users = config.users.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    fn load_org(&self, org: &mut Organization, hash: ObjectId) -> ConfigResult<()> {
        let scope = Scope::Org(org.name.clone());
        let tree = self.root_tree(&scope, hash)?;
        let file: OrgFile = self.read_toml(&scope, &tree)?;

        org.admins.extend(file.admins);
        org.members.extend(file.members);
        for (i, rule) in file.repos.into_iter().enumerate() {
            let pattern = Pattern::new(&rule.pattern).map_err(|message| ConfigError::Parse {
                scope: scope.clone(),
                path: format!("{}: repos[{i}].pattern", self.layout.config_file),
                message,
            })?;
            org.repos.push(RepoRule {
                pattern,
                members: rule.members,
                everyone: rule.everyone,
            });
        }

        debug!(org = %org.name, hash = %hash.short_hex(), rules = org.repos.len(), "loaded org scope");
        Ok(())
    }

    fn load_user(&self, user: &mut User, hash: ObjectId) -> ConfigResult<()> {
        let scope = Scope::User(user.name.clone());
        let tree = self.root_tree(&scope, hash)?;
        let keys_dir = &self.layout.keys_dir;

        let Some(entry) = tree.get(keys_dir) else {
            debug!(user = %user.name, hash = %hash.short_hex(), "user scope has no keys");
            return Ok(());
        };
        if entry.mode != EntryMode::Directory {
            return Err(ConfigError::Parse {
                scope,
                path: keys_dir.clone(),
                message: "expected a directory".into(),
            });
        }

        let keys = self
            .objects
            .read_tree(&self.scope_repo(&scope), &entry.object_id)
            .map_err(|source| store_error(&scope, source))?;
        for entry in &keys.entries {
            let path = format!("{keys_dir}/{}", entry.name);
            if !entry.mode.is_file() || !entry.name.ends_with(".pub") {
                return Err(ConfigError::Parse {
                    scope,
                    path,
                    message: "expected a *.pub file".into(),
                });
            }
            let text = self.read_blob_text(&scope, &path, &entry.object_id)?;
            for (line_no, line) in key_lines(&text) {
                let key = PublicKey::parse_authorized_key(line).map_err(|e| ConfigError::Parse {
                    scope: scope.clone(),
                    path: format!("{path}:{line_no}"),
                    message: e.to_string(),
                })?;
                user.add_key(key);
            }
        }

        debug!(user = %user.name, hash = %hash.short_hex(), keys = user.keys.len(), "loaded user scope");
        Ok(())
    }

    fn root_tree(&self, scope: &Scope, commit: ObjectId) -> ConfigResult<Tree> {
        let repo = self.scope_repo(scope);
        let commit = self
            .objects
            .read_commit(&repo, &commit)
            .map_err(|source| store_error(scope, source))?;
        self.objects
            .read_tree(&repo, &commit.tree)
            .map_err(|source| store_error(scope, source))
    }

    fn read_toml<T: DeserializeOwned>(&self, scope: &Scope, tree: &Tree) -> ConfigResult<T> {
        let path = &self.layout.config_file;
        let entry = tree.get(path).ok_or_else(|| ConfigError::Missing {
            scope: scope.clone(),
            path: path.clone(),
        })?;
        if !entry.mode.is_file() {
            return Err(ConfigError::Parse {
                scope: scope.clone(),
                path: path.clone(),
                message: "expected a file".into(),
            });
        }
        let text = self.read_blob_text(scope, path, &entry.object_id)?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            scope: scope.clone(),
            path: path.clone(),
            message: e.message().to_string(),
        })
    }

    fn read_blob_text(&self, scope: &Scope, path: &str, id: &ObjectId) -> ConfigResult<String> {
        let blob = self
            .objects
            .read_blob(&self.scope_repo(scope), id)
            .map_err(|source| store_error(scope, source))?;
        String::from_utf8(blob.data).map_err(|_| ConfigError::Parse {
            scope: scope.clone(),
            path: path.to_string(),
            message: "not valid UTF-8".into(),
        })
    }

    fn check_name(&self, scope: &Scope, name: &str) -> ConfigResult<()> {
        let invalid = |reason: String| ConfigError::InvalidName {
            scope: scope.clone(),
            name: name.to_string(),
            reason,
        };
        match validate_name(name) {
            Err(TypeError::InvalidName { reason, .. }) => return Err(invalid(reason)),
            Err(other) => return Err(invalid(other.to_string())),
            Ok(()) => {}
        }
        if self.layout.is_reserved(name) {
            return Err(invalid("reserved name".into()));
        }
        Ok(())
    }
}

fn store_error(scope: &Scope, source: gitdir_store::StoreError) -> ConfigError {
    ConfigError::Store {
        scope: scope.clone(),
        source,
    }
}

fn reject_undeclared(
    overrides: &HashOverrides,
    declared: impl Fn(&str) -> bool,
    kind: &'static str,
) -> ConfigResult<()> {
    for (name, hash) in overrides {
        if !hash.is_zero() && !declared(name) {
            return Err(ConfigError::Dangling {
                scope: Scope::Admin,
                kind,
                name: name.clone(),
            });
        }
    }
    Ok(())
}
