//! Error types for reference operations.

use gitdir_types::ObjectId;
use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The ref name is invalid.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidRefName { name: String, reason: String },

    /// The repository path is invalid.
    #[error("invalid repository path: {path}: {reason}")]
    InvalidRepoPath { path: String, reason: String },

    /// The ref moved since the caller read it.
    #[error("ref {name} in {repo} changed: expected {expected}, found {actual}")]
    Conflict {
        repo: String,
        name: String,
        expected: ObjectId,
        actual: ObjectId,
    },

    /// Another writer holds the ref lock.
    #[error("ref {name} in {repo} is locked by another update")]
    Locked { repo: String, name: String },

    /// The stored ref value could not be decoded.
    #[error("corrupt ref {name} in {repo}: {reason}")]
    Corrupt {
        repo: String,
        name: String,
        reason: String,
    },

    /// The repository's ref database failed.
    #[error("repository {repo}: {reason}")]
    Backend { repo: String, reason: String },

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;

impl RefError {
    pub(crate) fn backend(repo: &str, reason: impl ToString) -> Self {
        Self::Backend {
            repo: repo.to_string(),
            reason: reason.to_string(),
        }
    }
}
