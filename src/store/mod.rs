//! Store Module
//!
//! The record table: the only mutable state in etagkv.
//!
//! ## Responsibilities
//! - Own the key → value mapping exclusively
//! - Many concurrent readers, one exclusive writer
//! - Conditional writes compared by content fingerprint
//!
//! ## Key States
//! ```text
//!            Set / CAS ok              Set / CAS ok
//!   absent ───────────────▶ present ─────────────┐
//!     ▲                        │  ▲               │
//!     │        Delete          │  └───────────────┘
//!     └────────────────────────┘
//! ```
//! A conditional write against an absent key always fails.

mod table;

use bytes::Bytes;

use crate::error::Result;
use crate::fingerprint::Fingerprint;

pub use table::RecordTable;

/// Operations the request layer needs from a store
///
/// Implemented by [`RecordTable`]; the engine depends on this trait so a
/// test double can stand in for the table.
pub trait Store: Send + Sync {
    /// Current value for `key`, or `None` if absent
    fn get(&self, key: &[u8]) -> Option<Bytes>;

    /// Unconditional upsert
    fn set(&self, key: Vec<u8>, value: Bytes);

    /// Remove `key`; absent keys are a no-op
    fn delete(&self, key: &[u8]);

    /// Replace the value only if the stored value's fingerprint equals
    /// `expected`. Fails with `PreconditionFailed` on mismatch or absence.
    fn set_if_fingerprint_matches(
        &self,
        key: Vec<u8>,
        value: Bytes,
        expected: &Fingerprint,
    ) -> Result<()>;
}
