//! Error types for etagkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for etagkv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// Conditional write rejected: key absent or fingerprint mismatch.
    /// The caller should re-read and retry.
    #[error("Precondition failed: fingerprint mismatch")]
    PreconditionFailed,

    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key")]
    InvalidKey,

    #[error("Invalid length: {0}")]
    InvalidLength(usize),

    /// The declared payload length is missing or not a number, so the
    /// payload cannot be skipped
    #[error("Malformed payload length: {0}")]
    MalformedLength(String),

    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// Whether the request line was fully consumed, so the connection can
    /// keep reading further commands after reporting this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KvError::PreconditionFailed
                | KvError::KeyNotFound
                | KvError::InvalidKey
                | KvError::InvalidLength(_)
                | KvError::InvalidFingerprint(_)
                | KvError::Protocol(_)
        )
    }
}
