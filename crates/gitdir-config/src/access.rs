//! Identity and repository access resolution.

use gitdir_crypto::PublicKey;
use tracing::{debug, warn};

use crate::error::AccessError;
use crate::lookup::{classify, RepoLookup, RepoType};
use crate::model::{AccessLevel, Configuration, User};

/// The access an identity holds on a classified repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoAccess {
    pub level: AccessLevel,
    pub lookup: RepoLookup,
}

impl Configuration {
    /// Resolve the user owning `key`.
    ///
    /// Every user is visited even after a match. A key listed by more than
    /// one user identifies nobody. An unknown key connecting as the
    /// configured git user falls back to the anonymous identity when
    /// anonymous reads are enabled.
    pub fn lookup_user_by_key(
        &self,
        key: &PublicKey,
        transport_user: &str,
    ) -> Result<User, AccessError> {
        let fingerprint = key.fingerprint();
        let mut found: Option<&User> = None;
        let mut matches = 0usize;
        for user in self.users.values() {
            if user.keys.contains_key(&fingerprint) {
                matches += 1;
                found.get_or_insert(user);
            }
        }

        if matches > 1 {
            warn!(key = %fingerprint, users = matches, "key is listed by several users");
            return Err(AccessError::Unauthorized);
        }
        if let Some(user) = found {
            debug!(user = %user.name, key = %fingerprint, "resolved identity");
            return Ok(user.clone());
        }
        if self.options.anonymous_read && transport_user == self.options.git_user {
            debug!(key = %fingerprint, "unknown key, using anonymous identity");
            return Ok(User::anonymous());
        }
        debug!(key = %fingerprint, transport_user, "unknown key");
        Err(AccessError::Unauthorized)
    }

    /// Resolve what `user` may do on `repo_path`.
    pub fn lookup_repo_access(
        &self,
        user: &User,
        repo_path: &str,
    ) -> Result<RepoAccess, AccessError> {
        let lookup = classify(&self.layout, repo_path);
        let level = self.access_level(user, &lookup);
        debug!(
            user = %user.name,
            repo = repo_path,
            kind = %lookup.kind,
            level = %level,
            "resolved access"
        );
        if level == AccessLevel::None {
            return Err(AccessError::AccessDenied);
        }
        Ok(RepoAccess { level, lookup })
    }

    /// The access level of `user` on an already classified repository.
    pub fn access_level(&self, user: &User, lookup: &RepoLookup) -> AccessLevel {
        if lookup.kind == RepoType::Invalid {
            return AccessLevel::None;
        }
        if self.is_admin(user) {
            return AccessLevel::Admin;
        }

        match (lookup.kind, lookup.components.as_slice()) {
            (RepoType::UserConfig, [name]) => {
                if !user.anonymous && user.name == *name && self.users.contains_key(name) {
                    AccessLevel::Admin
                } else {
                    AccessLevel::None
                }
            }
            (RepoType::OrgConfig, [org]) => match self.org(org) {
                Some(org) if !user.anonymous && org.is_admin(&user.name) => AccessLevel::Admin,
                _ => AccessLevel::None,
            },
            (RepoType::OrgRepo, [org, rest @ ..]) if !rest.is_empty() => {
                let Some(org) = self.org(org) else {
                    return AccessLevel::None;
                };
                if !user.anonymous && org.is_admin(&user.name) {
                    return AccessLevel::Admin;
                }
                let Some(rule) = org.rule_for(&rest.join("/")) else {
                    return AccessLevel::None;
                };
                if user.anonymous {
                    rule.everyone.min(AccessLevel::Read)
                } else if org.is_member(&user.name) {
                    rule.members.max(rule.everyone)
                } else {
                    rule.everyone
                }
            }
            _ => AccessLevel::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{key, Fixture};

    fn fixture(anonymous_read: bool) -> Fixture {
        let fx = Fixture::new();
        fx.publish_admin(&format!(
            r#"
            admins = ["root"]

            [options]
            anonymous_read = {anonymous_read}

            [users.root]
            keys = ["{root}"]
            [users.alice]
            keys = ["{alice}"]
            [users.bob]
            keys = ["{bob}"]
            [users.carol]
            keys = ["{carol}"]

            [orgs.acme]
            admins = ["alice"]
            [orgs.empty]
            "#,
            root = key(9).to_authorized_key(),
            alice = key(1).to_authorized_key(),
            bob = key(2).to_authorized_key(),
            carol = key(3).to_authorized_key(),
        ));
        fx.publish(
            "orgs/acme",
            &[(
                "config.toml",
                r#"
                members = ["bob"]

                [[repos]]
                pattern = "payments"
                members = "read-write"
                everyone = "none"

                [[repos]]
                pattern = "docs/*"
                members = "read"
                everyone = "read-write"

                [[repos]]
                pattern = "public/**"
                members = "admin"
                everyone = "read-write"
                "#,
            )],
        );
        fx
    }

    fn user(config: &Configuration, name: &str) -> User {
        config.user(name).unwrap().clone()
    }

    fn level(config: &Configuration, user: &User, path: &str) -> Result<AccessLevel, AccessError> {
        config.lookup_repo_access(user, path).map(|access| access.level)
    }

    #[test]
    fn key_resolves_to_its_user() {
        let config = fixture(false).loader().load_current().unwrap();
        let alice = config.lookup_user_by_key(&key(1), "git").unwrap();
        assert_eq!(alice.name, "alice");
        assert!(!alice.anonymous);
    }

    #[test]
    fn comment_does_not_matter() {
        let config = fixture(false).loader().load_current().unwrap();
        let presented = key(2).with_comment("bob@elsewhere");
        assert_eq!(config.lookup_user_by_key(&presented, "git").unwrap().name, "bob");
    }

    #[test]
    fn unknown_key_is_unauthorized() {
        let config = fixture(false).loader().load_current().unwrap();
        assert_eq!(
            config.lookup_user_by_key(&key(42), "git"),
            Err(AccessError::Unauthorized)
        );
    }

    #[test]
    fn shared_key_identifies_nobody() {
        let fx = fixture(true);
        fx.publish(
            "users/alice",
            &[("keys/bob.pub", key(2).to_authorized_key().as_str())],
        );
        let config = fx.loader().load_current().unwrap();
        assert_eq!(
            config.lookup_user_by_key(&key(2), "git"),
            Err(AccessError::Unauthorized)
        );
        assert_eq!(config.lookup_user_by_key(&key(1), "git").unwrap().name, "alice");
    }

    #[test]
    fn random_keys_are_unknown() {
        let config = fixture(false).loader().load_current().unwrap();
        for _ in 0..8 {
            let signing = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
            let presented = PublicKey::from_verifying_key(signing.verifying_key());
            assert_eq!(
                config.lookup_user_by_key(&presented, "git"),
                Err(AccessError::Unauthorized)
            );
        }
    }

    #[test]
    fn anonymous_fallback_needs_git_user() {
        let config = fixture(true).loader().load_current().unwrap();
        let anon = config.lookup_user_by_key(&key(42), "git").unwrap();
        assert!(anon.anonymous);
        assert_eq!(
            config.lookup_user_by_key(&key(42), "deploy"),
            Err(AccessError::Unauthorized)
        );
    }

    #[test]
    fn global_admin_has_admin_everywhere_valid() {
        let config = fixture(false).loader().load_current().unwrap();
        let root = user(&config, "root");
        for path in ["admin", "orgs/acme", "users/bob", "acme/payments", "nobody/repo"] {
            assert_eq!(level(&config, &root, path), Ok(AccessLevel::Admin), "{path}");
        }
        assert_eq!(level(&config, &root, "not/../valid"), Err(AccessError::AccessDenied));
    }

    #[test]
    fn admin_repo_is_global_admins_only() {
        let config = fixture(false).loader().load_current().unwrap();
        let alice = user(&config, "alice");
        assert_eq!(level(&config, &alice, "admin.git"), Err(AccessError::AccessDenied));
    }

    #[test]
    fn user_config_belongs_to_its_user() {
        let config = fixture(false).loader().load_current().unwrap();
        let alice = user(&config, "alice");
        assert_eq!(level(&config, &alice, "users/alice"), Ok(AccessLevel::Admin));
        assert_eq!(level(&config, &alice, "users/bob"), Err(AccessError::AccessDenied));
        assert_eq!(level(&config, &alice, "users/ghost"), Err(AccessError::AccessDenied));
    }

    #[test]
    fn org_config_belongs_to_org_admins() {
        let config = fixture(false).loader().load_current().unwrap();
        assert_eq!(
            level(&config, &user(&config, "alice"), "orgs/acme"),
            Ok(AccessLevel::Admin)
        );
        assert_eq!(
            level(&config, &user(&config, "bob"), "orgs/acme"),
            Err(AccessError::AccessDenied)
        );
        assert_eq!(
            level(&config, &user(&config, "alice"), "orgs/ghost"),
            Err(AccessError::AccessDenied)
        );
    }

    #[test]
    fn org_admin_has_admin_on_every_org_repo() {
        let config = fixture(false).loader().load_current().unwrap();
        let alice = user(&config, "alice");
        for path in ["acme/payments", "acme/unlisted", "acme/deep/nested/repo"] {
            let access = config.lookup_repo_access(&alice, path).unwrap();
            assert!(access.level >= AccessLevel::ReadWrite, "{path}");
        }
    }

    #[test]
    fn members_get_max_of_member_and_everyone() {
        let config = fixture(false).loader().load_current().unwrap();
        let bob = user(&config, "bob");
        assert_eq!(level(&config, &bob, "acme/payments"), Ok(AccessLevel::ReadWrite));
        assert_eq!(level(&config, &bob, "acme/docs/api"), Ok(AccessLevel::ReadWrite));
        assert_eq!(level(&config, &bob, "acme/public/a/b"), Ok(AccessLevel::Admin));
    }

    #[test]
    fn outsiders_get_everyone_level() {
        let config = fixture(false).loader().load_current().unwrap();
        let carol = user(&config, "carol");
        assert_eq!(level(&config, &carol, "acme/payments"), Err(AccessError::AccessDenied));
        assert_eq!(level(&config, &carol, "acme/docs/api"), Ok(AccessLevel::ReadWrite));
    }

    #[test]
    fn anonymous_is_capped_at_read() {
        let config = fixture(true).loader().load_current().unwrap();
        let anon = User::anonymous();
        assert_eq!(level(&config, &anon, "acme/docs/api"), Ok(AccessLevel::Read));
        assert_eq!(level(&config, &anon, "acme/payments"), Err(AccessError::AccessDenied));
        assert_eq!(level(&config, &anon, "users/anonymous"), Err(AccessError::AccessDenied));
        assert_eq!(level(&config, &anon, "admin"), Err(AccessError::AccessDenied));
    }

    #[test]
    fn no_matching_rule_is_denied() {
        let config = fixture(false).loader().load_current().unwrap();
        let bob = user(&config, "bob");
        assert_eq!(level(&config, &bob, "acme/unlisted"), Err(AccessError::AccessDenied));
        assert_eq!(level(&config, &bob, "empty/anything"), Err(AccessError::AccessDenied));
        assert_eq!(level(&config, &bob, "ghost/repo"), Err(AccessError::AccessDenied));
    }

    #[test]
    fn access_carries_lookup() {
        let config = fixture(false).loader().load_current().unwrap();
        let access = config
            .lookup_repo_access(&user(&config, "bob"), "/acme/payments.git")
            .unwrap();
        assert_eq!(access.lookup.kind, RepoType::OrgRepo);
        assert_eq!(access.lookup.components, ["acme", "payments"]);
    }
}
