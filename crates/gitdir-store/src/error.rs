use gitdir_types::{ObjectId, TypeError};

use crate::object::ObjectKind;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The object exists but has a different kind than the caller asked for.
    #[error("object {id} is a {actual}, expected a {expected}")]
    KindMismatch {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// A tree path handed to the [`TreeBuilder`](crate::TreeBuilder) is unusable.
    #[error("invalid tree path: {0}")]
    InvalidPath(String),

    /// The repository path is invalid.
    #[error(transparent)]
    InvalidRepo(#[from] TypeError),

    /// The git object database of a repository failed.
    #[error("repository {repo}: {reason}")]
    Backend { repo: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// Attempted to read the zero object ID.
    #[error("the zero object id names no object")]
    ZeroObjectId,
}

impl StoreError {
    pub(crate) fn backend(repo: &str, reason: impl ToString) -> Self {
        Self::Backend {
            repo: repo.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
