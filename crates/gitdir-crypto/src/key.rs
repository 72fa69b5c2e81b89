use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use sha2::{Digest, Sha256};

/// The only key algorithm gitdir accepts.
const ED25519_ALGORITHM: &str = "ssh-ed25519";

/// Length of an ed25519 SSH wire blob: two length-prefixed strings.
const ED25519_BLOB_LEN: usize = 4 + ED25519_ALGORITHM.len() + 4 + 32;

/// Errors from parsing public key material.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("empty key line")]
    Empty,
    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("missing key data")]
    MissingData,
    #[error("invalid base64 key data: {0}")]
    InvalidEncoding(String),
    #[error("malformed key blob: {0}")]
    MalformedBlob(String),
    #[error("invalid ed25519 point")]
    InvalidKey,
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// OpenSSH-compatible SHA-256 fingerprint of a public key.
///
/// Renders as `SHA256:<unpadded base64>`, the same string `ssh-keygen -l`
/// prints, so operators can match it against their own keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA256:{}", STANDARD_NO_PAD.encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// An ed25519 SSH public key as presented by a session or listed in
/// configuration.
///
/// Equality and hashing use the key material only; the trailing comment of
/// an `authorized_keys` line is kept for display but never compared.
#[derive(Clone)]
pub struct PublicKey {
    key: ed25519_dalek::VerifyingKey,
    comment: Option<String>,
}

impl PublicKey {
    /// Wrap an ed25519 verifying key.
    pub fn from_verifying_key(key: ed25519_dalek::VerifyingKey) -> Self {
        Self { key, comment: None }
    }

    /// Attach a comment (usually `user@host`).
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Parse a single `authorized_keys` style line:
    /// `ssh-ed25519 <base64 wire blob> [comment]`.
    ///
    /// Key options before the algorithm are not supported.
    pub fn parse_authorized_key(line: &str) -> Result<Self, KeyError> {
        let mut parts = line.split_whitespace();
        let algorithm = parts.next().ok_or(KeyError::Empty)?;
        if algorithm != ED25519_ALGORITHM {
            return Err(KeyError::UnsupportedAlgorithm(algorithm.to_string()));
        }
        let data = parts.next().ok_or(KeyError::MissingData)?;
        let blob = STANDARD
            .decode(data)
            .map_err(|e| KeyError::InvalidEncoding(e.to_string()))?;
        let key = decode_wire_blob(&blob)?;

        let comment = parts.collect::<Vec<_>>().join(" ");
        Ok(Self {
            key,
            comment: (!comment.is_empty()).then_some(comment),
        })
    }

    /// The SHA-256 fingerprint of the SSH wire encoding.
    pub fn fingerprint(&self) -> Fingerprint {
        let digest = Sha256::digest(self.wire_blob());
        Fingerprint(digest.into())
    }

    /// The comment from the `authorized_keys` line, if any.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Raw 32-byte ed25519 public key.
    pub fn as_bytes(&self) -> [u8; 32] {
        self.key.to_bytes()
    }

    /// The underlying verifying key.
    pub fn verifying_key(&self) -> &ed25519_dalek::VerifyingKey {
        &self.key
    }

    /// Render as an `authorized_keys` line.
    pub fn to_authorized_key(&self) -> String {
        let data = STANDARD.encode(self.wire_blob());
        match &self.comment {
            Some(comment) => format!("{ED25519_ALGORITHM} {data} {comment}"),
            None => format!("{ED25519_ALGORITHM} {data}"),
        }
    }

    fn wire_blob(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(ED25519_BLOB_LEN);
        write_string(&mut blob, ED25519_ALGORITHM.as_bytes());
        write_string(&mut blob, &self.key.to_bytes());
        blob
    }
}

fn write_string(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
    buf.extend_from_slice(data);
}

fn read_string<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], KeyError> {
    if buf.len() < 4 {
        return Err(KeyError::MalformedBlob("truncated length prefix".into()));
    }
    let (len, rest) = buf.split_at(4);
    let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]) as usize;
    if rest.len() < len {
        return Err(KeyError::MalformedBlob(format!(
            "string of {len} bytes overruns blob"
        )));
    }
    let (value, rest) = rest.split_at(len);
    *buf = rest;
    Ok(value)
}

fn decode_wire_blob(blob: &[u8]) -> Result<ed25519_dalek::VerifyingKey, KeyError> {
    let mut cursor = blob;
    let algorithm = read_string(&mut cursor)?;
    if algorithm != ED25519_ALGORITHM.as_bytes() {
        return Err(KeyError::UnsupportedAlgorithm(
            String::from_utf8_lossy(algorithm).into_owned(),
        ));
    }
    let key = read_string(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(KeyError::MalformedBlob("trailing bytes after key".into()));
    }
    let key: [u8; 32] = key
        .try_into()
        .map_err(|_| KeyError::MalformedBlob(format!("expected 32 key bytes, got {}", key.len())))?;
    ed25519_dalek::VerifyingKey::from_bytes(&key).map_err(|_| KeyError::InvalidKey)
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.to_bytes().hash(state);
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_authorized_key())
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_authorized_key(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> PublicKey {
        let sk = ed25519_dalek::SigningKey::from_bytes(&[seed; 32]);
        PublicKey::from_verifying_key(sk.verifying_key())
    }

    #[test]
    fn authorized_key_roundtrip() {
        let pk = key(1).with_comment("alice@laptop");
        let line = pk.to_authorized_key();
        assert!(line.starts_with("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5"));
        assert!(line.ends_with(" alice@laptop"));

        let parsed = PublicKey::parse_authorized_key(&line).unwrap();
        assert_eq!(parsed, pk);
        assert_eq!(parsed.comment(), Some("alice@laptop"));
    }

    #[test]
    fn comment_is_not_part_of_identity() {
        let a = key(2).with_comment("one");
        let b = key(2).with_comment("two");
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn different_keys_have_different_fingerprints() {
        assert_ne!(key(3).fingerprint(), key(4).fingerprint());
    }

    #[test]
    fn fingerprint_format() {
        let fp = key(5).fingerprint().to_string();
        assert!(fp.starts_with("SHA256:"));
        // 32 bytes of unpadded base64 is 43 characters.
        assert_eq!(fp.len(), "SHA256:".len() + 43);
        assert!(!fp.ends_with('='));
    }

    #[test]
    fn random_keys_parse() {
        let sk = ed25519_dalek::SigningKey::generate(&mut rand::thread_rng());
        let pk = PublicKey::from_verifying_key(sk.verifying_key());
        let parsed: PublicKey = pk.to_string().parse().unwrap();
        assert_eq!(parsed, pk);
    }

    #[test]
    fn rejects_empty_line() {
        assert_eq!(PublicKey::parse_authorized_key("   "), Err(KeyError::Empty));
    }

    #[test]
    fn rejects_other_algorithms() {
        let err = PublicKey::parse_authorized_key("ssh-rsa AAAAB3NzaC1yc2E= bob").unwrap_err();
        assert_eq!(err, KeyError::UnsupportedAlgorithm("ssh-rsa".into()));
    }

    #[test]
    fn rejects_missing_data() {
        assert_eq!(
            PublicKey::parse_authorized_key("ssh-ed25519"),
            Err(KeyError::MissingData)
        );
    }

    #[test]
    fn rejects_bad_base64() {
        let err = PublicKey::parse_authorized_key("ssh-ed25519 !!!").unwrap_err();
        assert!(matches!(err, KeyError::InvalidEncoding(_)));
    }

    #[test]
    fn rejects_truncated_blob() {
        let line = format!("ssh-ed25519 {}", STANDARD.encode([0, 0, 0, 11, b's']));
        let err = PublicKey::parse_authorized_key(&line).unwrap_err();
        assert!(matches!(err, KeyError::MalformedBlob(_)));
    }

    #[test]
    fn rejects_mismatched_inner_algorithm() {
        let mut blob = Vec::new();
        write_string(&mut blob, b"ssh-rsa");
        write_string(&mut blob, &[0u8; 32]);
        let line = format!("ssh-ed25519 {}", STANDARD.encode(&blob));
        let err = PublicKey::parse_authorized_key(&line).unwrap_err();
        assert_eq!(err, KeyError::UnsupportedAlgorithm("ssh-rsa".into()));
    }

    #[test]
    fn debug_shows_fingerprint() {
        let pk = key(6);
        let debug = format!("{pk:?}");
        assert!(debug.contains("SHA256:"));
    }
}
