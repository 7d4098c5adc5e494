//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufWriter, ErrorKind};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

use bytes::Bytes;
use tracing::Dispatch;

use crate::config::Config;
use crate::error::{RespError, Result};
use crate::protocol::{parse_stream, write_reply, Reply};
use super::handler::Handler;
use super::shutdown::{CancellableStream, ShutdownToken};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Read half, consumed by the decoder thread when the connection starts
    reader: Option<CancellableStream>,

    /// Executes decoded commands
    handler: Arc<dyn Handler>,

    config: Config,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and configures timeouts
    pub fn new(
        stream: TcpStream,
        handler: Arc<dyn Handler>,
        config: &Config,
        token: ShutdownToken,
    ) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_write_timeout(config.write_timeout())?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let reader = CancellableStream::new(
            read_stream,
            token,
            config.poll_interval(),
            config.idle_timeout(),
        )?;

        Ok(Self {
            writer: BufWriter::new(stream),
            reader: Some(reader),
            handler,
            config: config.clone(),
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands from the payload stream and sends replies.
    /// Returns when the client disconnects, the server shuts down, or a
    /// write fails.
    pub fn handle(&mut self, logger: Dispatch) -> Result<()> {
        let Some(reader) = self.reader.take() else {
            return Err(RespError::Config("connection already handled".to_string()));
        };
        tracing::debug!("Connection established from {}", self.peer_addr);

        let payloads = parse_stream(reader, &self.config, logger)?;
        for payload in payloads {
            let reply = match payload {
                Ok(Reply::MultiBulk(args)) => {
                    if args.is_empty() {
                        continue;
                    }
                    let args: Vec<Bytes> = args.into_iter().map(Option::unwrap_or_default).collect();
                    tracing::trace!("Received command from {}: {} args", self.peer_addr, args.len());
                    self.handler.handle(&args)
                }
                Ok(other) => {
                    tracing::warn!(
                        "Ignoring {:?} frame from {}, commands must be arrays",
                        other.kind(),
                        self.peer_addr
                    );
                    continue;
                }
                Err(e) if !e.is_terminal() => {
                    tracing::debug!("Protocol error from {}: {}", self.peer_addr, e);
                    Reply::error(format!("ERR {}", e))
                }
                Err(RespError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Closing connection to {}: {}", self.peer_addr, e);
                    let _ = self.send_reply(&Reply::error(format!("ERR {}", e)));
                    return Err(e);
                }
            };

            if let Err(e) = self.send_reply(&reply) {
                // If the client disconnected before we could send the reply,
                // log and exit gracefully rather than treating it as a server error.
                if let RespError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) || io_err.kind() == ErrorKind::BrokenPipe {
                        tracing::debug!(
                            "Client {} disconnected before reply could be sent: {}",
                            self.peer_addr, e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }

        Ok(())
    }

    /// Send a reply to the client
    fn send_reply(&mut self, reply: &Reply) -> Result<()> {
        write_reply(&mut self.writer, reply)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // Fail the decoder's pending read so its thread exits with us
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);
    }
}

/// Errors that mean the peer (or the server) ended the session normally
fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::TimedOut
    )
}
