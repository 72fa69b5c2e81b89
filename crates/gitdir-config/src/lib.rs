//! Access-control configuration for gitdir.
//!
//! Users, organizations and their repository rules are not kept in a
//! database. They are committed to configuration repositories and resolved
//! from object hashes on every request:
//!
//! ```text
//! admin          config.toml: global admins, options, users, orgs
//! orgs/<org>     config.toml: org admins, members, repository rules
//! users/<user>   keys/*.pub:  the user's SSH public keys
//! ```
//!
//! A [`ConfigLoader`] turns a set of scope hashes into an immutable
//! [`Configuration`]. The configuration then answers two questions: who
//! does a key belong to ([`Configuration::lookup_user_by_key`]) and what may
//! they do on a repository path ([`Configuration::lookup_repo_access`]).
//! Pushes that change configuration are checked with
//! [`Configuration::validate`] against the configuration they would produce.
//!
//! # Modules
//!
//! - [`model`] -- users, organizations, rules and the resolved configuration
//! - [`loader`] -- building a configuration from object hashes
//! - [`lookup`] -- repository path classification
//! - [`access`] -- identity and access resolution
//! - [`validate`] -- post-load validation checks
//! - [`pattern`] -- repository glob patterns

pub mod access;
pub mod error;
mod file;
pub mod layout;
pub mod loader;
pub mod lookup;
pub mod model;
pub mod pattern;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use access::RepoAccess;
pub use error::{AccessError, ConfigError, ConfigResult, Scope, ValidationError};
pub use layout::Layout;
pub use loader::{ConfigLoader, HashOverrides};
pub use lookup::{classify, RepoLookup, RepoType};
pub use model::{AccessLevel, Configuration, Options, Organization, RepoRule, ScopeHashes, User};
pub use pattern::Pattern;
pub use validate::{ConfigCheck, PushContext, Validator};
