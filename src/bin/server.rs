//! etagkv Server Binary
//!
//! Starts the TCP server for etagkv.

use std::sync::Arc;

use clap::Parser;
use etagkv::network::Server;
use etagkv::{Config, Engine, KvError};
use tracing_subscriber::{fmt, EnvFilter};

/// etagkv Server
#[derive(Parser, Debug)]
#[command(name = "etagkv-server")]
#[command(about = "In-memory key-value store with fingerprint-based conditional writes")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:8085")]
    listen: String,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "16")]
    workers: usize,

    /// Accepted connections allowed to wait for a worker
    #[arg(long, default_value = "1024")]
    backlog: usize,

    /// Largest accepted value in KB
    #[arg(short = 'p', long, default_value = "1024")]
    max_payload_kb: usize,

    /// Idle read timeout in milliseconds (0 disables)
    #[arg(long, default_value = "30000")]
    read_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,etagkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("etagkv server v{}", etagkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let max_payload_size = match payload_bytes(args.max_payload_kb) {
        Ok(size) => size,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .worker_threads(args.workers)
        .connection_backlog(args.backlog)
        .max_payload_size(max_payload_size)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let engine = Arc::new(Engine::new(&config));

    let server = match Server::bind(config, engine) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // Set up Ctrl+C handler
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("graceful shutdown");
        shutdown.shutdown();
    }) {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

/// Convert the `--max-payload-kb` flag to bytes
fn payload_bytes(kb: usize) -> etagkv::Result<usize> {
    kb.checked_mul(1024)
        .ok_or_else(|| KvError::Config(format!("max payload of {} KB is too large", kb)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_bytes_rejects_overflow() {
        assert_eq!(payload_bytes(1024).unwrap(), 1024 * 1024);
        assert!(matches!(payload_bytes(usize::MAX), Err(KvError::Config(_))));
    }
}
