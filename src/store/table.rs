//! Record table implementation
//!
//! HashMap-based table with RwLock for concurrency.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::{KvError, Result};
use crate::fingerprint::{Fingerprint, Fingerprinter};

use super::Store;

/// In-memory key → value table
///
/// ## Concurrency
/// - `records`: one process-wide RwLock
///   - `get` takes the read lock, so readers proceed together
///   - `set`, `delete` and `set_if_fingerprint_matches` take the write lock
///     for their whole read-modify-write sequence
/// - Every method takes exactly one lock scope and never calls back into
///   the table while holding it
pub struct RecordTable {
    records: RwLock<HashMap<Vec<u8>, Bytes>>,
    fingerprinter: Arc<dyn Fingerprinter>,
}

impl RecordTable {
    /// Create an empty table using `fingerprinter` for conditional writes
    pub fn new(fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            fingerprinter,
        }
    }

    /// Get a value by key (read lock)
    ///
    /// The returned `Bytes` is a snapshot; later writes replace the stored
    /// handle and never touch it.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.records.read().get(key).cloned()
    }

    /// Insert or overwrite a value (write lock)
    pub fn set(&self, key: Vec<u8>, value: Bytes) {
        self.records.write().insert(key, value);
    }

    /// Remove a key if present (write lock)
    pub fn delete(&self, key: &[u8]) {
        self.records.write().remove(key);
    }

    /// Compare-and-swap by content fingerprint (write lock)
    ///
    /// The lookup, the fingerprint comparison and the replacement all happen
    /// under one write guard, so no other operation can interleave.
    pub fn set_if_fingerprint_matches(
        &self,
        key: Vec<u8>,
        value: Bytes,
        expected: &Fingerprint,
    ) -> Result<()> {
        let mut records = self.records.write();

        let current = records.get_mut(&key).ok_or(KvError::PreconditionFailed)?;
        if self.fingerprinter.fingerprint(current) != *expected {
            return Err(KvError::PreconditionFailed);
        }

        *current = value;
        Ok(())
    }

    /// Check presence without cloning the value
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.records.read().contains_key(key)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl fmt::Debug for RecordTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordTable")
            .field("len", &self.len())
            .finish()
    }
}

impl Store for RecordTable {
    fn get(&self, key: &[u8]) -> Option<Bytes> {
        RecordTable::get(self, key)
    }

    fn set(&self, key: Vec<u8>, value: Bytes) {
        RecordTable::set(self, key, value)
    }

    fn delete(&self, key: &[u8]) {
        RecordTable::delete(self, key)
    }

    fn set_if_fingerprint_matches(
        &self,
        key: Vec<u8>,
        value: Bytes,
        expected: &Fingerprint,
    ) -> Result<()> {
        RecordTable::set_if_fingerprint_matches(self, key, value, expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Sha256Fingerprinter;

    /// Fingerprinter that always returns the same token, to check the table
    /// asks the injected capability rather than a hard-coded digest
    struct ConstantFingerprinter;

    impl Fingerprinter for ConstantFingerprinter {
        fn fingerprint(&self, _value: &[u8]) -> Fingerprint {
            Fingerprint::from_digest(&[0xab])
        }
    }

    #[test]
    fn test_uses_injected_fingerprinter() {
        let table = RecordTable::new(Arc::new(ConstantFingerprinter));
        table.set(b"foo".to_vec(), Bytes::from_static(b"bar"));

        let expected = Fingerprint::from_digest(&[0xab]);
        table
            .set_if_fingerprint_matches(b"foo".to_vec(), Bytes::from_static(b"baz"), &expected)
            .unwrap();
        assert_eq!(table.get(b"foo"), Some(Bytes::from_static(b"baz")));

        let sha = Sha256Fingerprinter::new().fingerprint(b"baz");
        let result =
            table.set_if_fingerprint_matches(b"foo".to_vec(), Bytes::from_static(b"qux"), &sha);
        assert!(matches!(result, Err(KvError::PreconditionFailed)));
    }

    #[test]
    fn test_read_snapshot_survives_overwrite() {
        let table = RecordTable::new(Arc::new(Sha256Fingerprinter::new()));
        table.set(b"k".to_vec(), Bytes::from_static(b"v1"));

        let snapshot = table.get(b"k").unwrap();
        table.set(b"k".to_vec(), Bytes::from_static(b"v2"));

        assert_eq!(snapshot, Bytes::from_static(b"v1"));
        assert_eq!(table.get(b"k"), Some(Bytes::from_static(b"v2")));
    }

    #[test]
    fn test_len_and_contains() {
        let table = RecordTable::new(Arc::new(Sha256Fingerprinter::new()));
        assert!(table.is_empty());

        table.set(b"a".to_vec(), Bytes::from_static(b"1"));
        table.set(b"b".to_vec(), Bytes::from_static(b"2"));
        table.set(b"a".to_vec(), Bytes::from_static(b"3"));

        assert_eq!(table.len(), 2);
        assert!(table.contains_key(b"a"));
        assert!(!table.contains_key(b"c"));
    }
}
