//! Configuration for etagkv
//!
//! Centralized configuration with sensible defaults.

use crate::error::{KvError, Result};
use crate::protocol::MAX_PAYLOAD_SIZE;

/// Main configuration for an etagkv server instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of worker threads serving connections
    pub worker_threads: usize,

    /// Accepted connections allowed to wait for a free worker
    pub connection_backlog: usize,

    /// Connection read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    /// How often the acceptor checks for shutdown when idle (milliseconds)
    pub accept_poll_ms: u64,

    // -------------------------------------------------------------------------
    // Request Limits
    // -------------------------------------------------------------------------
    /// Largest value accepted by a write, in bytes
    pub max_payload_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8085".to_string(),
            worker_threads: 16,
            connection_backlog: 1024,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
            accept_poll_ms: 50,
            max_payload_size: 1024 * 1024, // 1 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            return Err(KvError::Config("listen address is empty".to_string()));
        }
        if self.worker_threads == 0 {
            return Err(KvError::Config("worker_threads must be at least 1".to_string()));
        }
        if self.connection_backlog == 0 {
            return Err(KvError::Config(
                "connection_backlog must be at least 1".to_string(),
            ));
        }
        if self.max_payload_size == 0 {
            return Err(KvError::Config(
                "max_payload_size must be at least 1".to_string(),
            ));
        }
        // Clients refuse responses above the protocol cap
        if self.max_payload_size > MAX_PAYLOAD_SIZE {
            return Err(KvError::Config(format!(
                "max_payload_size {} exceeds the protocol limit of {} bytes",
                self.max_payload_size, MAX_PAYLOAD_SIZE
            )));
        }
        if self.accept_poll_ms == 0 {
            return Err(KvError::Config("accept_poll_ms must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set how many accepted connections may queue for a worker
    pub fn connection_backlog(mut self, count: usize) -> Self {
        self.config.connection_backlog = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the acceptor's shutdown poll interval (in milliseconds)
    pub fn accept_poll_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_ms = ms;
        self
    }

    /// Set the maximum write payload (in bytes)
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.config.max_payload_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
