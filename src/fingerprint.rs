//! Fingerprint Module
//!
//! Deterministic content digests used as change-detection tokens and as the
//! comparison key for conditional writes.
//!
//! A fingerprint depends only on the value's bytes: no seed, time or nonce
//! goes into it, so it is stable across calls and across restarts.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::KvError;

/// Length of a SHA-256 fingerprint in hex characters
pub const FINGERPRINT_LEN: usize = 64;

/// Hex-encoded digest of a value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Build a fingerprint from raw digest bytes
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hex.push_str(&format!("{:02x}", byte));
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = KvError;

    /// Parse a client-supplied fingerprint, normalizing to lowercase.
    ///
    /// Only the shape is checked (non-empty, whole bytes of hex) so that
    /// fingerprinters with other digest sizes stay usable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() % 2 != 0 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(KvError::InvalidFingerprint(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

/// Capability for computing value fingerprints
///
/// Injected into the record table at construction so the digest algorithm
/// can be swapped without touching the table's logic.
pub trait Fingerprinter: Send + Sync {
    fn fingerprint(&self, value: &[u8]) -> Fingerprint;
}

/// SHA-256 fingerprinter (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Fingerprinter;

impl Sha256Fingerprinter {
    pub fn new() -> Self {
        Self
    }
}

impl Fingerprinter for Sha256Fingerprinter {
    fn fingerprint(&self, value: &[u8]) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(value);
        Fingerprint::from_digest(&hasher.finalize())
    }
}
