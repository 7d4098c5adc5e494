//! Payload stream
//!
//! Runs a [`Decoder`] on its own thread and hands each payload to the
//! consumer through a zero-capacity channel. A send only completes when the
//! consumer receives, so a slow consumer throttles how fast bytes are drained
//! from the source.
//!
//! The last payload ever delivered is a terminal error; the channel is closed
//! right after it.

use std::any::Any;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
pub use crossbeam::channel::RecvTimeoutError;
use tracing::Dispatch;

use crate::config::Config;
use crate::error::{RespError, Result};
use super::{Decoder, Reply};

/// One decoded unit: a reply, or the error raised while decoding it
pub type Payload = std::result::Result<Reply, RespError>;

/// Receiving end of a decoder thread
pub struct PayloadStream {
    receiver: Receiver<Payload>,
    worker: Option<JoinHandle<()>>,
}

impl PayloadStream {
    /// Block until the next payload; `None` once the stream is closed
    pub fn recv(&self) -> Option<Payload> {
        self.receiver.recv().ok()
    }

    /// Like [`recv`](Self::recv), giving up after `timeout`
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> std::result::Result<Payload, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Wait for the decoder thread to exit
    ///
    /// The thread exits after its terminal payload has been received, or as
    /// soon as a send fails because this stream was dropped.
    pub fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            // The worker never unwinds past its own fault boundary
            let _ = worker.join();
        }
    }
}

impl Iterator for PayloadStream {
    type Item = Payload;

    fn next(&mut self) -> Option<Payload> {
        self.recv()
    }
}

/// Spawn a decoder thread over `source`
///
/// `logger` is installed as the tracing dispatcher of the decoder thread
/// only; pass `tracing::dispatcher::get_default(Dispatch::clone)` to keep
/// logging wherever the caller logs.
pub fn parse_stream<R>(source: R, config: &Config, logger: Dispatch) -> Result<PayloadStream>
where
    R: Read + Send + 'static,
{
    let (sender, receiver) = channel::bounded(0);
    let decoder = Decoder::with_config(source, config);

    let worker = thread::Builder::new()
        .name("resp-decoder".to_string())
        .spawn(move || {
            tracing::dispatcher::with_default(&logger, || run_decoder(decoder, sender))
        })?;

    Ok(PayloadStream {
        receiver,
        worker: Some(worker),
    })
}

/// Decode loop; the only place decoder faults are caught
fn run_decoder<R: Read>(mut decoder: Decoder<R>, sender: Sender<Payload>) {
    loop {
        let step = panic::catch_unwind(AssertUnwindSafe(|| decoder.next_payload()));

        let payload = match step {
            Ok(Some(payload)) => payload,
            Ok(None) => break,
            Err(panic) => {
                decoder.halt();
                Err(RespError::Fault(panic_message(panic.as_ref())))
            }
        };

        match &payload {
            Err(RespError::Fault(msg)) => tracing::error!("Decoder fault: {}", msg),
            Err(e) if e.is_terminal() => tracing::debug!("Decoder stopped: {}", e),
            Err(e) => tracing::warn!("Recoverable decode error: {}", e),
            Ok(reply) => tracing::trace!("Decoded {:?} frame", reply.kind()),
        }

        if sender.send(payload).is_err() {
            tracing::debug!("Payload consumer went away, stopping decoder");
            break;
        }
        if decoder.is_halted() {
            break;
        }
    }
}

/// Extract a printable message from a panic payload
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    }
}
