//! Foundation types for gitdir.
//!
//! Every other gitdir crate depends on `gitdir-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] - Git object id; the zero id means "no object"
//! - [`git_dir`] - Where a hosted repository lives on disk
//! - [`validate_name`] - Naming rules shared by users and organizations

pub mod error;
pub mod name;
pub mod object;
pub mod repo;

pub use error::TypeError;
pub use name::{validate_name, MAX_NAME_LEN};
pub use object::{ObjectId, OBJECT_ID_LEN};
pub use repo::{git_dir, validate_repo_path};
