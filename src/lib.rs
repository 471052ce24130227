//! # etagkv
//!
//! An in-memory key-value store with:
//! - Fingerprint-based optimistic concurrency (compare-and-swap by content)
//! - Many-reader/single-writer record table
//! - Line-oriented textual TCP protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (acceptor + worker threads)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │     (key/payload checks, if-match routing, fingerprints)     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!                ┌─────────────┐        ┌───────────────┐
//!                │ RecordTable │───────▶│ Fingerprinter │
//!                │  (RwLock)   │        │   (SHA-256)   │
//!                └─────────────┘        └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod fingerprint;
pub mod store;
pub mod protocol;
pub mod engine;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::Engine;
pub use fingerprint::{Fingerprint, Fingerprinter, Sha256Fingerprinter};
pub use store::{RecordTable, Store};
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of etagkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
