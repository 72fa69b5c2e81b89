use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length in bytes of a git SHA-1 object id.
pub const OBJECT_ID_LEN: usize = 20;

/// Git object id (SHA-1) of a blob, tree or commit.
///
/// Identical content always produces the same `ObjectId`. The all-zero id is
/// reserved: it names no object and is what a hook receives for a created or
/// deleted ref, and what the configuration loader treats as "scope absent".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Create an `ObjectId` from a pre-computed hash.
    pub const fn from_hash(hash: [u8; OBJECT_ID_LEN]) -> Self {
        Self(hash)
    }

    /// The zero object ID. Represents "no object".
    pub const fn zero() -> Self {
        Self([0u8; OBJECT_ID_LEN])
    }

    /// Returns `true` if this is the zero object ID.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; OBJECT_ID_LEN]
    }

    /// The raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    ///
    /// A non-empty string made only of `0` characters parses as the zero id
    /// whatever its length.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if !s.is_empty() && s.bytes().all(|b| b == b'0') {
            return Ok(Self::zero());
        }
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; OBJECT_ID_LEN] =
            bytes.try_into().map_err(|_| TypeError::InvalidLength {
                expected: OBJECT_ID_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// The id as gitoxide sees it.
    pub fn to_gix(&self) -> gix_hash::ObjectId {
        gix_hash::ObjectId::Sha1(self.0)
    }

    /// Convert a gitoxide id, rejecting hash kinds other than SHA-1.
    pub fn from_gix(id: &gix_hash::oid) -> Result<Self, TypeError> {
        Self::from_slice(id.as_bytes())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.trim())
    }
}

impl From<[u8; OBJECT_ID_LEN]> for ObjectId {
    fn from(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ObjectId> for gix_hash::ObjectId {
    fn from(id: ObjectId) -> Self {
        id.to_gix()
    }
}
