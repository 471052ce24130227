//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Worker thread pool for connections, fed by a bounded channel
//! - Commands routed through Engine

mod server;
mod connection;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use server::Server;
pub use connection::Connection;

/// Cloneable flag that tells the server to drain and stop
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown; safe to call more than once, from any thread
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
