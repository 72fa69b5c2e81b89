//! Git hooks for gitdir.
//!
//! git runs `pre-receive`, then `update` once per ref, then `post-receive`
//! for every push. gitdir installs all three and routes them through
//! [`HookDispatcher::run_hook`]:
//!
//! - every hook resolves the pushing key and its access to the repository
//!   under the configuration currently in force, rejecting unknown keys and
//!   repositories the identity cannot see;
//! - `update` additionally requires write access, and for repositories that
//!   hold configuration (`admin`, `orgs/<org>`, `users/<user>`) rebuilds the
//!   configuration with the pushed commit and validates it against the
//!   pushing identity before the ref may move.

pub mod dispatcher;
pub mod error;
pub mod kind;
pub mod update;

pub use dispatcher::{HookDispatcher, HookRequest, UpdateArgs};
pub use error::{HookError, HookResult};
pub use kind::HookKind;
pub use update::{read_updates, RefUpdate};
