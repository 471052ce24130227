//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{self, BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::protocol::{read_command, write_response, Command, Response};

use super::ShutdownHandle;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the request adapter
    engine: Arc<Engine>,

    /// Set when the server is draining
    shutdown: ShutdownHandle,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, engine: Arc<Engine>, shutdown: ShutdownHandle) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            engine,
            shutdown,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses.
    /// Returns when the client disconnects, the server drains, or an
    /// unrecoverable error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            if self.shutdown.is_shutdown() {
                tracing::debug!("Closing connection {} for shutdown", self.peer_addr);
                return Ok(());
            }

            // Read next command
            let command = match read_command(&mut self.reader, self.engine.max_payload_size()) {
                Ok(cmd) => cmd,
                Err(KvError::Io(ref e)) if is_disconnect(e) => {
                    tracing::debug!("Client {} disconnected ({:?})", self.peer_addr, e.kind());
                    return Ok(());
                }
                Err(KvError::Io(ref e))
                    if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
                {
                    // Read timeout (Windows uses TimedOut instead of WouldBlock)
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) if e.is_recoverable() => {
                    tracing::debug!("Rejected request from {}: {}", self.peer_addr, e);
                    self.send_response(Response::from_error(&e))?;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Send error response if possible
                    let _ = self.send_response(Response::from_error(&e));
                    return Err(e);
                }
            };

            tracing::trace!(
                "Received {} {} from {}",
                command.command_type().as_str(),
                String::from_utf8_lossy(command.key().unwrap_or_default()),
                self.peer_addr
            );

            // Execute command
            let response = self.execute_command(command);

            // Send response
            if let Err(e) = self.send_response(response) {
                // The client went away before the response could be sent
                if let KvError::Io(ref io_err) = e {
                    if is_disconnect(io_err) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Execute a command and return a response
    fn execute_command(&self, command: Command) -> Response {
        match self.engine.execute(command) {
            Ok(response) => response,
            Err(e) => Response::from_error(&e),
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}
