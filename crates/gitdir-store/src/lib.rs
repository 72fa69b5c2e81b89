//! Git object access for gitdir.
//!
//! Configuration lives inside repositories as ordinary git objects. This
//! crate is the accessor the configuration loader reads them through: every
//! object is immutable and identified by its git object id.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file contents
//! - [`Tree`] -- directory listing mapping names to object ids
//! - [`Commit`] -- root tree plus parents and message
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`GitObjectStore`] -- bare repositories below a root directory, read
//!   with `gix-odb` and written with `gix`
//!
//! [`TreeBuilder`] writes a set of files as nested trees and a commit.
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Concurrent reads are always safe.
//! 3. The store never interprets object contents beyond the typed decoders.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod builder;
pub mod error;
pub mod git;
pub mod object;
pub mod traits;

pub use builder::TreeBuilder;
pub use error::{StoreError, StoreResult};
pub use git::GitObjectStore;
pub use object::{encode_commit, Blob, Commit, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry};
pub use traits::ObjectStore;
