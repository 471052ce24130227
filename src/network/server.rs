//! TCP Server
//!
//! Accepts connections and dispatches to worker threads.

use std::collections::HashMap;
use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};
use parking_lot::Mutex;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::{encode_response, Response};

use super::{Connection, ShutdownHandle};

/// TCP server for etagkv
///
/// ## Lifecycle
/// 1. `bind` opens the listener
/// 2. `run` accepts until a `ShutdownHandle` fires
/// 3. Drain: stop accepting, close the read side of open connections so
///    idle clients are released, let requests already received finish,
///    join the workers
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
    connections: Arc<ConnectionRegistry>,
}

impl Server {
    /// Bind the listener described by `config`
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: ShutdownHandle::new(),
            connections: Arc::new(ConnectionRegistry::default()),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops the server from any thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Start the server (blocking until shutdown completes)
    pub fn run(&self) -> Result<()> {
        let addr = self.local_addr()?;
        tracing::info!("listening: {}", addr);

        let (tx, rx) = channel::bounded::<TcpStream>(self.config.connection_backlog);
        let workers = self.spawn_workers(rx)?;
        let poll = Duration::from_millis(self.config.accept_poll_ms);

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    tracing::trace!("Accepted connection from {}", peer);
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Failed to configure connection from {}: {}", peer, e);
                        continue;
                    }
                    match tx.try_send(stream) {
                        Ok(()) => {}
                        Err(TrySendError::Full(stream)) => {
                            tracing::warn!("Connection queue full, rejecting {}", peer);
                            reject_busy(stream);
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            tracing::error!("All workers exited, stopping acceptor");
                            break;
                        }
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(poll);
                }
                Err(e) => {
                    // e.g. out of file descriptors; back off and keep serving
                    tracing::warn!("accept failed: {}", e);
                    thread::sleep(poll);
                }
            }
        }

        tracing::info!("Draining {} open connection(s)", self.connections.len());
        drop(tx);
        self.connections.close_reads();

        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked during shutdown");
            }
        }

        tracing::info!("Server stopped accepting, all workers joined");
        Ok(())
    }

    fn spawn_workers(&self, rx: Receiver<TcpStream>) -> Result<Vec<JoinHandle<()>>> {
        let mut workers = Vec::with_capacity(self.config.worker_threads);

        for id in 0..self.config.worker_threads {
            let rx = rx.clone();
            let engine = Arc::clone(&self.engine);
            let shutdown = self.shutdown.clone();
            let connections = Arc::clone(&self.connections);
            let timeouts = (self.config.read_timeout_ms, self.config.write_timeout_ms);

            let handle = thread::Builder::new()
                .name(format!("etagkv-worker-{}", id))
                .spawn(move || {
                    for stream in rx.iter() {
                        serve(stream, &engine, &shutdown, &connections, timeouts);
                    }
                })?;
            workers.push(handle);
        }

        Ok(workers)
    }
}

/// Serve one connection on the current worker thread
///
/// A panic inside a request is confined to that connection; the worker
/// keeps serving.
fn serve(
    stream: TcpStream,
    engine: &Arc<Engine>,
    shutdown: &ShutdownHandle,
    connections: &ConnectionRegistry,
    (read_ms, write_ms): (u64, u64),
) {
    let id = match stream.try_clone() {
        Ok(clone) => connections.register(clone),
        Err(e) => {
            tracing::warn!("Failed to register connection: {}", e);
            return;
        }
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<()> {
        let mut connection = Connection::new(stream, Arc::clone(engine), shutdown.clone())?;
        connection.set_timeouts(read_ms, write_ms)?;
        connection.handle()
    }));

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("Connection closed with error: {}", e),
        Err(_) => tracing::error!("Connection handler panicked; connection dropped"),
    }

    connections.unregister(id);
}

/// Tell a client the server cannot take it right now
fn reject_busy(mut stream: TcpStream) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.write_all(&encode_response(&Response::error("server busy")));
    let _ = stream.shutdown(Shutdown::Both);
}

/// Open connections, so a drain can release idle clients
#[derive(Default)]
struct ConnectionRegistry {
    next_id: AtomicU64,
    streams: Mutex<HashMap<u64, TcpStream>>,
}

impl ConnectionRegistry {
    fn register(&self, stream: TcpStream) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.streams.lock().insert(id, stream);
        id
    }

    fn unregister(&self, id: u64) {
        self.streams.lock().remove(&id);
    }

    fn len(&self) -> usize {
        self.streams.lock().len()
    }

    /// Shut the read half of every open connection. Responses to requests
    /// already read can still be written.
    fn close_reads(&self) {
        for stream in self.streams.lock().values() {
            let _ = stream.shutdown(Shutdown::Read);
        }
    }
}
