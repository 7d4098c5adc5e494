//! TCP Server
//!
//! Accepts connections and runs each one on its own thread.

use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::Dispatch;

use crate::config::Config;
use crate::error::Result;
use super::connection::Connection;
use super::handler::Handler;
use super::shutdown::ShutdownToken;

/// Sent to clients refused because of `max_connections`
const MAX_CLIENTS_REPLY: &[u8] = b"-ERR max number of clients reached\r\n";

/// TCP server for respkv
pub struct Server {
    config: Config,
    handler: Arc<dyn Handler>,
    listener: TcpListener,
    token: ShutdownToken,

    /// Logging capability handed to every decoder thread
    logger: Dispatch,

    active: Arc<AtomicUsize>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Server {
    /// Bind the configured listen address
    ///
    /// Port 0 picks a free port; see [`local_addr`](Self::local_addr).
    pub fn bind(config: Config, handler: Arc<dyn Handler>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            handler,
            listener,
            token: ShutdownToken::new(),
            logger: tracing::dispatcher::get_default(Dispatch::clone),
            active: Arc::new(AtomicUsize::new(0)),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Token that stops the server when cancelled
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.token.clone()
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Accept connections until shutdown, then drain (blocking)
    pub fn run(&self) -> Result<()> {
        let poll = self.config.poll_interval();

        while !self.token.is_cancelled() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = self.admit(stream) {
                        tracing::warn!("Failed to set up connection from {}: {}", addr, e);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(poll),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(poll);
                }
            }
            self.reap_finished();
        }

        tracing::info!("Shutting down, draining {} connections", self.active_connections());
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Connection thread panicked");
            }
        }
        self.handler.close();
        tracing::info!("Server stopped");
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    fn admit(&self, mut stream: TcpStream) -> Result<()> {
        // Accepted sockets may inherit the listener's non-blocking mode
        stream.set_nonblocking(false)?;

        if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
            tracing::warn!("Refusing connection, {} clients connected", self.config.max_connections);
            stream.write_all(MAX_CLIENTS_REPLY)?;
            return Ok(());
        }

        let mut connection =
            Connection::new(stream, Arc::clone(&self.handler), &self.config, self.token.clone())?;
        let logger = self.logger.clone();
        let active = Arc::clone(&self.active);
        active.fetch_add(1, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", connection.peer_addr()))
            .spawn(move || {
                if let Err(e) = connection.handle(logger) {
                    tracing::debug!("Connection {} ended with error: {}", connection.peer_addr(), e);
                }
                active.fetch_sub(1, Ordering::SeqCst);
            });

        match spawned {
            Ok(worker) => {
                self.workers.lock().push(worker);
                Ok(())
            }
            Err(e) => {
                self.active.fetch_sub(1, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Join connection threads that already finished
    fn reap_finished(&self) {
        let mut workers = self.workers.lock();
        let (finished, running): (Vec<_>, Vec<_>) =
            std::mem::take(&mut *workers).into_iter().partition(|w| w.is_finished());
        *workers = running;
        drop(workers);

        for worker in finished {
            if worker.join().is_err() {
                tracing::error!("Connection thread panicked");
            }
        }
    }
}
