//! Reference store over bare git repositories.
//!
//! Refs of the hosted repository `repo` are the refs of the bare repository
//! `<root>/<repo>.git`, read and written with `gix`. An update is a single
//! ref transaction whose expected previous value is the caller's
//! `expected_old`; git's `<ref>.lock` protocol makes racing writers fail
//! instead of overwriting each other.

use std::path::{Path, PathBuf};

use gitdir_types::{git_dir, ObjectId};
use gix::refs::transaction::{Change, LogChange, PreviousValue, RefEdit, RefLog};
use gix::refs::{FullName, Target, TargetRef};
use tracing::debug;

use crate::error::{RefError, Result};
use crate::names::{validate_ref_name, validate_repo_path};
use crate::traits::RefStore;

const REFLOG_MESSAGE: &str = "gitdir: update ref";

/// A [`RefStore`] backed by the ref databases of bare git repositories.
#[derive(Debug, Clone)]
pub struct GitRefStore {
    root: PathBuf,
}

impl GitRefStore {
    /// Open the repositories below `root`.
    pub fn open(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn repo_dir(&self, repo: &str) -> Result<PathBuf> {
        validate_repo_path(repo)?;
        git_dir(&self.root, repo).map_err(|e| RefError::backend(repo, e))
    }

    /// The repository, or `None` if it has not been created.
    fn open_repo(&self, repo: &str) -> Result<Option<gix::Repository>> {
        let dir = self.repo_dir(repo)?;
        if !dir.join("refs").is_dir() {
            return Ok(None);
        }
        gix::open(&dir)
            .map(Some)
            .map_err(|e| RefError::backend(repo, e))
    }

    fn target_id(repo: &str, name: &str, target: &gix::hash::oid) -> Result<ObjectId> {
        ObjectId::from_gix(target).map_err(|e| RefError::Corrupt {
            repo: repo.to_string(),
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Work out why a ref transaction was refused.
    fn refused(&self, repo: &str, name: &str, expected: ObjectId, reason: String) -> RefError {
        let actual = match self.read_ref(repo, name) {
            Ok(actual) => actual.unwrap_or_else(ObjectId::zero),
            Err(e) => return e,
        };
        if actual != expected {
            return RefError::Conflict {
                repo: repo.to_string(),
                name: name.to_string(),
                expected,
                actual,
            };
        }
        let lock = self
            .repo_dir(repo)
            .map(|dir| dir.join(format!("{name}.lock")).exists())
            .unwrap_or(false);
        if lock {
            return RefError::Locked {
                repo: repo.to_string(),
                name: name.to_string(),
            };
        }
        RefError::backend(repo, reason)
    }
}

impl RefStore for GitRefStore {
    fn read_ref(&self, repo: &str, name: &str) -> Result<Option<ObjectId>> {
        validate_ref_name(name)?;
        let Some(repository) = self.open_repo(repo)? else {
            return Ok(None);
        };
        let Some(reference) = repository
            .try_find_reference(name)
            .map_err(|e| RefError::backend(repo, e))?
        else {
            return Ok(None);
        };

        let id = match reference.target() {
            TargetRef::Object(oid) => Self::target_id(repo, name, oid)?,
            TargetRef::Symbolic(target) => {
                let Some(peeled) = repository
                    .try_find_reference(target)
                    .map_err(|e| RefError::backend(repo, e))?
                else {
                    return Ok(None);
                };
                match peeled.target() {
                    TargetRef::Object(oid) => Self::target_id(repo, name, oid)?,
                    TargetRef::Symbolic(_) => {
                        return Err(RefError::Corrupt {
                            repo: repo.to_string(),
                            name: name.to_string(),
                            reason: "symbolic ref chain is too deep".into(),
                        })
                    }
                }
            }
        };
        Ok((!id.is_zero()).then_some(id))
    }

    fn update_ref(
        &self,
        repo: &str,
        name: &str,
        expected_old: ObjectId,
        new: ObjectId,
    ) -> Result<()> {
        validate_ref_name(name)?;
        let repository = self
            .open_repo(repo)?
            .ok_or_else(|| RefError::backend(repo, "repository does not exist"))?;

        let actual = self.read_ref(repo, name)?.unwrap_or_else(ObjectId::zero);
        if actual != expected_old {
            return Err(RefError::Conflict {
                repo: repo.to_string(),
                name: name.to_string(),
                expected: expected_old,
                actual,
            });
        }
        if expected_old.is_zero() && new.is_zero() {
            return Ok(());
        }

        let expected = if expected_old.is_zero() {
            PreviousValue::MustNotExist
        } else {
            PreviousValue::MustExistAndMatch(Target::Object(expected_old.to_gix()))
        };
        let change = if new.is_zero() {
            Change::Delete {
                expected,
                log: RefLog::AndReference,
            }
        } else {
            Change::Update {
                log: LogChange {
                    message: REFLOG_MESSAGE.into(),
                    ..Default::default()
                },
                expected,
                new: Target::Object(new.to_gix()),
            }
        };
        let full_name = FullName::try_from(name).map_err(|e| RefError::InvalidRefName {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        repository
            .edit_reference(RefEdit {
                change,
                name: full_name,
                deref: false,
            })
            .map_err(|e| self.refused(repo, name, expected_old, e.to_string()))?;

        debug!(
            repo,
            name,
            old = %expected_old.short_hex(),
            new = %new.short_hex(),
            "updated ref"
        );
        Ok(())
    }

    fn list_refs(&self, repo: &str, prefix: &str) -> Result<Vec<(String, ObjectId)>> {
        let Some(repository) = self.open_repo(repo)? else {
            return Ok(Vec::new());
        };
        let platform = repository
            .references()
            .map_err(|e| RefError::backend(repo, e))?;
        let iter = platform.all().map_err(|e| RefError::backend(repo, e))?;

        let mut refs = Vec::new();
        for reference in iter {
            let reference = reference.map_err(|e| RefError::backend(repo, e))?;
            let refname = reference.name().as_bstr().to_string();
            if !refname.starts_with(prefix) {
                continue;
            }
            if let TargetRef::Object(oid) = reference.target() {
                let id = Self::target_id(repo, &refname, oid)?;
                refs.push((refname, id));
            }
        }
        refs.sort();
        Ok(refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MAIN: &str = "refs/heads/main";

    fn id(n: u8) -> ObjectId {
        ObjectId::from_hash([n; 20])
    }

    fn temp_store(repos: &[&str]) -> (tempfile::TempDir, GitRefStore) {
        let dir = tempfile::tempdir().unwrap();
        for repo in repos {
            let path = git_dir(dir.path(), repo).unwrap();
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            gix::init_bare(&path).unwrap();
        }
        let store = GitRefStore::open(dir.path());
        (dir, store)
    }

    #[test]
    fn create_read_and_layout() {
        let (dir, store) = temp_store(&["orgs/acme"]);
        store.update_ref("orgs/acme", MAIN, ObjectId::zero(), id(1)).unwrap();

        assert_eq!(store.read_ref("orgs/acme", MAIN).unwrap(), Some(id(1)));
        let on_disk = dir.path().join("orgs/acme.git/refs/heads/main");
        let contents = fs::read_to_string(on_disk).unwrap();
        assert_eq!(contents.trim(), id(1).to_hex());
    }

    #[test]
    fn reads_refs_written_by_git() {
        let (dir, store) = temp_store(&["admin"]);
        let hex = "ce013625030ba8dba906f756967f9e9ca394464a";
        fs::write(dir.path().join("admin.git/refs/heads/main"), format!("{hex}\n")).unwrap();
        assert_eq!(store.resolve("admin", MAIN).unwrap().to_hex(), hex);
    }

    #[test]
    fn missing_ref_or_repo_is_none() {
        let (_dir, store) = temp_store(&["admin"]);
        assert_eq!(store.read_ref("admin", MAIN).unwrap(), None);
        assert!(store.resolve("admin", MAIN).unwrap().is_zero());
        assert_eq!(store.read_ref("users/ghost", MAIN).unwrap(), None);
        assert!(store.list_refs("users/ghost", "").unwrap().is_empty());
    }

    #[test]
    fn update_in_missing_repo_fails() {
        let (_dir, store) = temp_store(&[]);
        assert!(matches!(
            store.update_ref("admin", MAIN, ObjectId::zero(), id(1)),
            Err(RefError::Backend { .. })
        ));
    }

    #[test]
    fn stale_update_conflicts_and_leaves_value() {
        let (_dir, store) = temp_store(&["admin"]);
        store.update_ref("admin", MAIN, ObjectId::zero(), id(1)).unwrap();
        store.update_ref("admin", MAIN, id(1), id(2)).unwrap();

        let err = store.update_ref("admin", MAIN, id(1), id(3)).unwrap_err();
        assert!(matches!(err, RefError::Conflict { actual, .. } if actual == id(2)));
        assert_eq!(store.resolve("admin", MAIN).unwrap(), id(2));
        assert!(store.update_ref("admin", MAIN, ObjectId::zero(), id(3)).is_err());
    }

    #[test]
    fn held_lock_rejects_writer() {
        let (dir, store) = temp_store(&["admin"]);
        store.update_ref("admin", MAIN, ObjectId::zero(), id(1)).unwrap();
        fs::write(dir.path().join("admin.git/refs/heads/main.lock"), b"").unwrap();

        assert!(matches!(
            store.update_ref("admin", MAIN, id(1), id(2)),
            Err(RefError::Locked { .. })
        ));
        assert_eq!(store.resolve("admin", MAIN).unwrap(), id(1));
    }

    #[test]
    fn update_to_zero_deletes() {
        let (dir, store) = temp_store(&["users/bob"]);
        store.update_ref("users/bob", MAIN, ObjectId::zero(), id(1)).unwrap();
        store.update_ref("users/bob", MAIN, id(1), ObjectId::zero()).unwrap();

        assert_eq!(store.read_ref("users/bob", MAIN).unwrap(), None);
        assert!(!dir.path().join("users/bob.git/refs/heads/main").exists());
    }

    #[test]
    fn list_refs_sorted_and_filtered() {
        let (_dir, store) = temp_store(&["acme/app"]);
        store.update_ref("acme/app", MAIN, ObjectId::zero(), id(1)).unwrap();
        store.update_ref("acme/app", "refs/heads/dev", ObjectId::zero(), id(2)).unwrap();
        store.update_ref("acme/app", "refs/tags/v1", ObjectId::zero(), id(3)).unwrap();

        let heads = store.list_refs("acme/app", "refs/heads/").unwrap();
        assert_eq!(
            heads,
            vec![
                ("refs/heads/dev".to_string(), id(2)),
                ("refs/heads/main".to_string(), id(1)),
            ]
        );
        assert_eq!(store.list_refs("acme/app", "refs/").unwrap().len(), 3);
    }

    #[test]
    fn invalid_names_rejected() {
        let (_dir, store) = temp_store(&["admin"]);
        assert!(matches!(
            store.update_ref("admin", "main", ObjectId::zero(), id(1)),
            Err(RefError::InvalidRefName { .. })
        ));
        assert!(matches!(
            store.read_ref("../admin", MAIN),
            Err(RefError::InvalidRepoPath { .. })
        ));
    }

    #[test]
    fn racing_writers_have_one_winner() {
        use std::sync::Arc;
        use std::thread;

        let (_dir, store) = temp_store(&["orgs/acme"]);
        let store = Arc::new(store);
        store.update_ref("orgs/acme", MAIN, ObjectId::zero(), id(1)).unwrap();

        let handles: Vec<_> = (2..10u8)
            .map(|n| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.update_ref("orgs/acme", MAIN, id(1), id(n)).is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
