//! Engine Module
//!
//! The request adapter between the wire protocol and the record table.
//!
//! ## Responsibilities
//! - Enforce request-level preconditions (non-empty key, payload bounds)
//!   before touching the store
//! - Choose conditional or unconditional writes based on the if-match token
//! - Report the fingerprint of every value read or written

use std::sync::Arc;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::fingerprint::{Fingerprint, Fingerprinter, Sha256Fingerprinter};
use crate::protocol::{Command, Response};
use crate::store::{RecordTable, Store};

/// The request adapter
///
/// Cheap to share behind an `Arc`: all state lives in the store, which
/// does its own locking.
pub struct Engine {
    /// The record table (or a stand-in implementing `Store`)
    store: Arc<dyn Store>,

    /// Computes the fingerprints reported back to clients
    fingerprinter: Arc<dyn Fingerprinter>,

    /// Largest accepted write payload
    max_payload_size: usize,
}

impl Engine {
    /// Create an engine over a fresh SHA-256 record table
    pub fn new(config: &Config) -> Self {
        let fingerprinter: Arc<dyn Fingerprinter> = Arc::new(Sha256Fingerprinter::new());
        let table = RecordTable::new(Arc::clone(&fingerprinter));
        Self::with_store(Arc::new(table), fingerprinter, config.max_payload_size)
    }

    /// Create an engine over an existing store
    pub fn with_store(
        store: Arc<dyn Store>,
        fingerprinter: Arc<dyn Fingerprinter>,
        max_payload_size: usize,
    ) -> Self {
        Self {
            store,
            fingerprinter,
            max_payload_size,
        }
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Result<Response> {
        match command {
            Command::Get { key } => {
                let (value, fingerprint) = self.get(&key)?;
                Ok(Response::ok(Some(fingerprint), Some(value)))
            }
            Command::Head { key } => {
                let fingerprint = self.head(&key)?;
                Ok(Response::ok(Some(fingerprint), None))
            }
            Command::Put {
                key,
                value,
                if_match,
            } => {
                let fingerprint = self.put(key, value, if_match.as_ref())?;
                Ok(Response::ok(Some(fingerprint), None))
            }
            Command::Delete { key } => {
                self.delete(&key)?;
                Ok(Response::ok(None, None))
            }
            Command::Ping => Ok(Response::ok(None, Some(Bytes::from_static(b"PONG")))),
        }
    }

    /// Get a value and its fingerprint
    ///
    /// Absence is reported as `KeyNotFound` so the connection can map it to
    /// a not-found response.
    pub fn get(&self, key: &[u8]) -> Result<(Bytes, Fingerprint)> {
        validate_key(key)?;

        let value = self.store.get(key).ok_or(KvError::KeyNotFound)?;
        let fingerprint = self.fingerprinter.fingerprint(&value);
        Ok((value, fingerprint))
    }

    /// Get only the fingerprint of a value
    pub fn head(&self, key: &[u8]) -> Result<Fingerprint> {
        self.get(key).map(|(_, fingerprint)| fingerprint)
    }

    /// Write a value, conditionally when `if_match` is given
    ///
    /// Returns the fingerprint of the value now stored. It is derived from
    /// the request payload and never stored alongside the value.
    pub fn put(
        &self,
        key: Vec<u8>,
        value: Bytes,
        if_match: Option<&Fingerprint>,
    ) -> Result<Fingerprint> {
        validate_key(&key)?;
        self.validate_payload(&value)?;

        let fingerprint = self.fingerprinter.fingerprint(&value);

        match if_match {
            Some(expected) => {
                if let Err(e) = self.store.set_if_fingerprint_matches(key, value, expected) {
                    tracing::debug!("Conditional write rejected (if-match {}): {}", expected, e);
                    return Err(e);
                }
            }
            None => self.store.set(key, value),
        }

        Ok(fingerprint)
    }

    /// Delete a key; deleting an absent key succeeds
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        validate_key(key)?;
        self.store.delete(key);
        Ok(())
    }

    /// Largest accepted write payload
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    fn validate_payload(&self, value: &[u8]) -> Result<()> {
        if value.is_empty() {
            return Err(KvError::InvalidLength(0));
        }
        if value.len() > self.max_payload_size {
            return Err(KvError::PayloadTooLarge {
                len: value.len(),
                max: self.max_payload_size,
            });
        }
        Ok(())
    }
}

fn validate_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(KvError::InvalidKey);
    }
    Ok(())
}
