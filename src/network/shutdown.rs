//! Shutdown signalling
//!
//! A cancellation token passed from the server down to every connection and
//! observed at each blocking accept and read.

use std::io::{self, ErrorKind, Read};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cloneable cancellation token
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    cancelled: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown; every clone observes it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Read half of a connection that gives up when the token is cancelled
///
/// The socket read timeout is set to the poll interval; every time it fires
/// the token is checked. Cancellation surfaces as `ConnectionAborted`, an
/// idle connection past `idle_timeout` as `TimedOut`. Either one ends the
/// decoder reading from this source.
pub struct CancellableStream {
    stream: TcpStream,
    token: ShutdownToken,
    idle_timeout: Option<Duration>,
    last_activity: Instant,
}

impl CancellableStream {
    pub fn new(
        stream: TcpStream,
        token: ShutdownToken,
        poll_interval: Duration,
        idle_timeout: Option<Duration>,
    ) -> io::Result<Self> {
        stream.set_read_timeout(Some(poll_interval))?;
        Ok(Self {
            stream,
            token,
            idle_timeout,
            last_activity: Instant::now(),
        })
    }
}

impl Read for CancellableStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.token.is_cancelled() {
                return Err(io::Error::new(ErrorKind::ConnectionAborted, "server shutting down"));
            }
            match self.stream.read(buf) {
                Ok(n) => {
                    self.last_activity = Instant::now();
                    return Ok(n);
                }
                // Unix reports an expired read timeout as WouldBlock, Windows as TimedOut
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    if let Some(limit) = self.idle_timeout {
                        if self.last_activity.elapsed() >= limit {
                            return Err(io::Error::new(ErrorKind::TimedOut, "connection idle"));
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}
