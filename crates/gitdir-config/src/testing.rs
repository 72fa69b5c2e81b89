//! Bare-repository fixtures shared by this crate's tests.

use ed25519_dalek::SigningKey;
use gitdir_crypto::PublicKey;
use gitdir_refs::{GitRefStore, RefStore};
use gitdir_store::{GitObjectStore, TreeBuilder};
use gitdir_types::ObjectId;
use tempfile::TempDir;

use crate::loader::ConfigLoader;

const BRANCH: &str = "refs/heads/main";

/// Deterministic key derived from `seed`.
pub(crate) fn key(seed: u8) -> PublicKey {
    PublicKey::from_verifying_key(SigningKey::from_bytes(&[seed; 32]).verifying_key())
}

pub(crate) struct Fixture {
    pub objects: GitObjectStore,
    pub refs: GitRefStore,
    _root: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self {
            objects: GitObjectStore::open(root.path()),
            refs: GitRefStore::open(root.path()),
            _root: root,
        }
    }

    pub fn loader(&self) -> ConfigLoader<'_> {
        ConfigLoader::new(&self.objects, &self.refs)
    }

    /// Write a commit holding `files` into `repo` without moving any ref.
    pub fn commit(&self, repo: &str, files: &[(&str, &str)]) -> ObjectId {
        self.objects.init_repo(repo).unwrap();
        let mut builder = TreeBuilder::new();
        for (path, contents) in files {
            builder.insert(path, *contents).unwrap();
        }
        builder
            .commit(&self.objects, repo, vec![], "fixture <fixture@localhost>", "fixture")
            .unwrap()
    }

    /// Commit `files` and point the repository's config branch at it.
    pub fn publish(&self, repo: &str, files: &[(&str, &str)]) -> ObjectId {
        let id = self.commit(repo, files);
        self.refs
            .update_ref(repo, BRANCH, self.current(repo), id)
            .unwrap();
        id
    }

    pub fn publish_admin(&self, config: &str) -> ObjectId {
        self.publish("admin", &[("config.toml", config)])
    }

    pub fn current(&self, repo: &str) -> ObjectId {
        self.refs.resolve(repo, BRANCH).unwrap()
    }
}
