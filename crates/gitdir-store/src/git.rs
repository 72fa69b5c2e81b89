//! Object store over bare git repositories.
//!
//! Every hosted repository is a bare repository at `<root>/<repo>.git`.
//! Reads go through the repository's object database with `gix-odb`, which
//! follows packs and `objects/info/alternates`. Writes go through `gix`.
//!
//! While a push is in flight git keeps the incoming objects in a quarantine
//! directory and only migrates them once every hook has accepted the push.
//! [`GitObjectStore::with_quarantine`] makes those objects visible for the
//! repository being pushed to, so a hook can read the commit it is judging.

use std::fs;
use std::path::{Path, PathBuf};

use gitdir_types::{git_dir, ObjectId};
use gix_object::{Find, Write};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

#[derive(Debug, Clone)]
struct Quarantine {
    repo: String,
    objects_dir: PathBuf,
}

/// An [`ObjectStore`] reading the bare repositories below a root directory.
#[derive(Debug, Clone)]
pub struct GitObjectStore {
    root: PathBuf,
    quarantine: Option<Quarantine>,
}

impl GitObjectStore {
    /// Open the repositories below `root`. Nothing is touched until the
    /// first read or write.
    pub fn open(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            quarantine: None,
        }
    }

    /// Also look up objects of `repo` in `objects_dir`, ahead of the
    /// repository's own object database.
    pub fn with_quarantine(mut self, repo: &str, objects_dir: impl Into<PathBuf>) -> Self {
        self.quarantine = Some(Quarantine {
            repo: repo.to_string(),
            objects_dir: objects_dir.into(),
        });
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the bare repository for `repo` unless it already exists, and
    /// return its directory.
    pub fn init_repo(&self, repo: &str) -> StoreResult<PathBuf> {
        let dir = git_dir(&self.root, repo)?;
        if !dir.join("objects").is_dir() {
            if let Some(parent) = dir.parent() {
                fs::create_dir_all(parent)?;
            }
            gix::init_bare(&dir).map_err(|e| StoreError::backend(repo, e))?;
            debug!(repo, path = %dir.display(), "initialized bare repository");
        }
        Ok(dir)
    }

    fn find_in(repo: &str, objects_dir: &Path, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        if !objects_dir.is_dir() {
            return Ok(None);
        }
        let odb = gix_odb::at(objects_dir).map_err(|e| StoreError::backend(repo, e))?;
        let mut buf = Vec::new();
        let found = odb
            .try_find(&id.to_gix(), &mut buf)
            .map_err(|e| StoreError::backend(repo, e))?;
        Ok(found.map(|data| StoredObject::new(data.kind.into(), data.data.to_vec())))
    }
}

impl ObjectStore for GitObjectStore {
    fn read(&self, repo: &str, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        if id.is_zero() {
            return Ok(None);
        }
        let dir = git_dir(&self.root, repo)?;
        if let Some(quarantine) = self.quarantine.as_ref().filter(|q| q.repo == repo) {
            if let Some(object) = Self::find_in(repo, &quarantine.objects_dir, id)? {
                return Ok(Some(object));
            }
        }
        Self::find_in(repo, &dir.join("objects"), id)
    }

    fn write(&self, repo: &str, object: &StoredObject) -> StoreResult<ObjectId> {
        let dir = git_dir(&self.root, repo)?;
        let repository = gix::open(&dir).map_err(|e| StoreError::backend(repo, e))?;
        let written = repository
            .write_buf(object.kind.into(), &object.data)
            .map_err(|e| StoreError::backend(repo, e))?;
        let id = ObjectId::from_gix(&written).map_err(|e| StoreError::backend(repo, e))?;
        debug!(repo, id = %id.short_hex(), kind = %object.kind, size = object.size(), "wrote object");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::object::{Blob, ObjectKind};

    fn temp_store() -> (tempfile::TempDir, GitObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = GitObjectStore::open(dir.path());
        store.init_repo("admin").unwrap();
        (dir, store)
    }

    #[test]
    fn blob_ids_match_git() {
        let (_dir, store) = temp_store();
        let id = store.write("admin", &Blob::new("hello\n").to_stored_object()).unwrap();
        assert_eq!(id.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
        assert!(store.exists("admin", &id).unwrap());
        assert_eq!(store.read_blob("admin", &id).unwrap().data, b"hello\n");
    }

    #[test]
    fn repository_is_bare_git_layout() {
        let (dir, store) = temp_store();
        store.init_repo("users/alice").unwrap();
        let git_dir = dir.path().join("users").join("alice.git");
        assert!(git_dir.join("objects").is_dir());
        assert!(git_dir.join("HEAD").is_file());

        let id = store.write("users/alice", &Blob::new("x").to_stored_object()).unwrap();
        let hex = id.to_hex();
        assert!(git_dir.join("objects").join(&hex[..2]).join(&hex[2..]).is_file());
    }

    #[test]
    fn objects_are_per_repository() {
        let (_dir, store) = temp_store();
        store.init_repo("orgs/acme").unwrap();
        let id = store.write("admin", &Blob::new("admin only").to_stored_object()).unwrap();
        assert!(store.read("orgs/acme", &id).unwrap().is_none());
        assert!(store.read("users/nobody", &id).unwrap().is_none());
    }

    #[test]
    fn missing_object_is_none() {
        let (_dir, store) = temp_store();
        let id = ObjectId::from_hash([8; 20]);
        assert!(store.read("admin", &id).unwrap().is_none());
        assert!(!store.exists("admin", &id).unwrap());
        assert!(matches!(
            store.read_object("admin", &id),
            Err(StoreError::NotFound(missing)) if missing == id
        ));
        assert!(matches!(
            store.read_object("admin", &ObjectId::zero()),
            Err(StoreError::ZeroObjectId)
        ));
    }

    #[test]
    fn rewrite_is_noop() {
        let (_dir, store) = temp_store();
        let obj = Blob::new("again").to_stored_object();
        assert_eq!(store.write("admin", &obj).unwrap(), store.write("admin", &obj).unwrap());
    }

    #[test]
    fn invalid_repo_path() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.read("../escape", &ObjectId::from_hash([1; 20])),
            Err(StoreError::InvalidRepo(_))
        ));
    }

    #[test]
    fn quarantined_objects_visible_to_pushed_repo_only() {
        let (_dir, store) = temp_store();
        let incoming = store.init_repo("incoming").unwrap();
        let id = store.write("incoming", &Blob::new("pushed").to_stored_object()).unwrap();
        assert!(store.read("admin", &id).unwrap().is_none());

        let pushing = store.clone().with_quarantine("admin", incoming.join("objects"));
        assert_eq!(pushing.read_blob("admin", &id).unwrap().data, b"pushed");
        store.init_repo("orgs/acme").unwrap();
        assert!(pushing.read("orgs/acme", &id).unwrap().is_none());
    }

    #[test]
    fn full_commit_chain_on_disk() {
        let (dir, store) = temp_store();
        let commit_id = TreeBuilder::new()
            .with_file("config.toml", "admins = []")
            .unwrap()
            .commit(&store, "admin", vec![], "root <root@localhost>", "init")
            .unwrap();

        let reopened = GitObjectStore::open(dir.path());
        let stored = reopened.read_object("admin", &commit_id).unwrap();
        assert_eq!(stored.kind, ObjectKind::Commit);
        let commit = reopened.read_commit("admin", &commit_id).unwrap();
        let tree = reopened.read_tree("admin", &commit.tree).unwrap();
        assert!(tree.get("config.toml").unwrap().mode.is_file());
    }
}
