//! The [`RefStore`] trait defining the reference storage interface.

use gitdir_types::ObjectId;

use crate::error::Result;

/// Storage backend for per-repository refs.
///
/// Implementations must be thread-safe (`Send + Sync`). A missing ref and a
/// ref holding the zero id are the same thing: `update_ref` to zero deletes,
/// and `expected_old` of zero means "must not exist yet".
pub trait RefStore: Send + Sync {
    /// Read a ref (e.g. `refs/heads/main`) of a repository.
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, repo: &str, name: &str) -> Result<Option<ObjectId>>;

    /// Atomically move a ref from `expected_old` to `new`.
    ///
    /// Fails with [`RefError::Conflict`](crate::RefError::Conflict) if the
    /// ref's current value is not `expected_old`, leaving it untouched.
    fn update_ref(&self, repo: &str, name: &str, expected_old: ObjectId, new: ObjectId)
        -> Result<()>;

    /// List the refs of a repository whose name starts with `prefix`, sorted
    /// by name.
    fn list_refs(&self, repo: &str, prefix: &str) -> Result<Vec<(String, ObjectId)>>;

    /// The current value of a ref, or the zero id if it does not exist.
    fn resolve(&self, repo: &str, name: &str) -> Result<ObjectId> {
        Ok(self.read_ref(repo, name)?.unwrap_or_else(ObjectId::zero))
    }
}
