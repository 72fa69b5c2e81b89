//! Cryptographic primitives for gitdir.
//!
//! Provides the ed25519 SSH [`PublicKey`] that identifies a pushing user and
//! the SHA-256 [`Fingerprint`] it is looked up by.
//!
//! All crypto operations wrap established libraries.

pub mod key;

pub use key::{Fingerprint, KeyError, PublicKey};
