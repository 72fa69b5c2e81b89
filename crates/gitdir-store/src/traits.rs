use gitdir_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, Commit, StoredObject, Tree};

/// Per-repository git object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written: the same data always produces the
///   same ID.
/// - Concurrent reads are always safe (objects are immutable).
/// - All I/O errors are propagated, never silently ignored.
///
/// The configuration engine only ever reads; `write` exists for tooling and
/// for building fixtures.
pub trait ObjectStore: Send + Sync {
    /// Read an object of `repo` by id.
    ///
    /// Returns `Ok(None)` if the object (or the repository) does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, repo: &str, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object into `repo` and return its id.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn write(&self, repo: &str, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in `repo`.
    fn exists(&self, repo: &str, id: &ObjectId) -> StoreResult<bool> {
        Ok(!id.is_zero() && self.read(repo, id)?.is_some())
    }

    /// Read an object that must exist.
    fn read_object(&self, repo: &str, id: &ObjectId) -> StoreResult<StoredObject> {
        if id.is_zero() {
            return Err(StoreError::ZeroObjectId);
        }
        self.read(repo, id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Read and decode a blob.
    fn read_blob(&self, repo: &str, id: &ObjectId) -> StoreResult<Blob> {
        Blob::decode(id, &self.read_object(repo, id)?)
    }

    /// Read and decode a tree.
    fn read_tree(&self, repo: &str, id: &ObjectId) -> StoreResult<Tree> {
        Tree::decode(id, &self.read_object(repo, id)?)
    }

    /// Read and decode a commit.
    fn read_commit(&self, repo: &str, id: &ObjectId) -> StoreResult<Commit> {
        Commit::decode(id, &self.read_object(repo, id)?)
    }

    /// Write multiple objects in a batch and return their IDs.
    fn write_batch(&self, repo: &str, objects: &[StoredObject]) -> StoreResult<Vec<ObjectId>> {
        objects.iter().map(|obj| self.write(repo, obj)).collect()
    }
}
