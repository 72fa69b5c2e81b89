//! Writing file sets as trees and commits.
//!
//! The configuration engine only reads objects; this is the write side used
//! by tooling and tests to produce configuration commits.

use std::collections::BTreeMap;

use gitdir_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{encode_commit, Blob, Tree, TreeEntry};
use crate::traits::ObjectStore;

#[derive(Default)]
struct Dir {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeMap<String, Dir>,
}

/// Accumulates `path -> contents` pairs and writes them as nested trees.
#[derive(Default)]
pub struct TreeBuilder {
    root: Dir,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at a `/`-separated path, replacing any earlier file there.
    pub fn insert(&mut self, path: &str, contents: impl Into<Vec<u8>>) -> StoreResult<()> {
        let components: Vec<&str> = path.split('/').collect();
        if components.iter().any(|c| c.is_empty() || *c == "." || *c == "..") {
            return Err(StoreError::InvalidPath(format!("{path:?}")));
        }
        let Some((file, parents)) = components.split_last() else {
            return Err(StoreError::InvalidPath("empty path".into()));
        };

        let mut dir = &mut self.root;
        for name in parents {
            if dir.files.contains_key(*name) {
                return Err(StoreError::InvalidPath(format!(
                    "{path:?} nests under the file {name:?}"
                )));
            }
            dir = dir.dirs.entry(name.to_string()).or_default();
        }
        if dir.dirs.contains_key(*file) {
            return Err(StoreError::InvalidPath(format!(
                "{path:?} would replace a directory"
            )));
        }
        dir.files.insert(file.to_string(), contents.into());
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> StoreResult<Self> {
        self.insert(path, contents)?;
        Ok(self)
    }

    /// Write every blob and tree into `repo`, returning the root tree id.
    pub fn write(&self, store: &dyn ObjectStore, repo: &str) -> StoreResult<ObjectId> {
        write_dir(store, repo, &self.root)
    }

    /// Write the trees plus a commit on top of `parents`, returning the
    /// commit id. `identity` is a `Name <email>` pair.
    pub fn commit(
        &self,
        store: &dyn ObjectStore,
        repo: &str,
        parents: Vec<ObjectId>,
        identity: &str,
        message: &str,
    ) -> StoreResult<ObjectId> {
        let tree = self.write(store, repo)?;
        store.write(repo, &encode_commit(&tree, &parents, identity, message))
    }
}

fn write_dir(store: &dyn ObjectStore, repo: &str, dir: &Dir) -> StoreResult<ObjectId> {
    let mut entries = Vec::with_capacity(dir.files.len() + dir.dirs.len());
    for (name, contents) in &dir.files {
        let id = store.write(repo, &Blob::new(contents.clone()).to_stored_object())?;
        entries.push(TreeEntry::file(name, id));
    }
    for (name, sub) in &dir.dirs {
        entries.push(TreeEntry::dir(name, write_dir(store, repo, sub)?));
    }
    store.write(repo, &Tree::new(entries).to_stored_object()?)
}
