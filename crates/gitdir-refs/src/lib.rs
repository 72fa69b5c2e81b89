//! Reference management for gitdir.
//!
//! Every hosted repository has its own ref namespace (`refs/heads/*`,
//! `refs/tags/*`). The configuration loader reads the configuration branch
//! of each config repository through a [`RefStore`] to find the *current
//! committed* hash of a scope.
//!
//! Updates are optimistic compare-and-swap: a writer names the value it
//! expects to replace, and exactly one of several racing writers wins. This
//! is the only serialization point between concurrent pushes to the same
//! repository; the configuration engine adds no locks of its own.
//!
//! # Modules
//!
//! - [`error`] - Error types for ref operations
//! - [`traits`] - The [`RefStore`] trait defining the storage interface
//! - [`names`] - Ref name and repository path validation
//! - [`git`] - [`GitRefStore`] over bare git repositories

pub mod error;
pub mod git;
pub mod names;
pub mod traits;

pub use error::{RefError, Result};
pub use git::GitRefStore;
pub use names::{validate_ref_name, validate_repo_path};
pub use traits::RefStore;
