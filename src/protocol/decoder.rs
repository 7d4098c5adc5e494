//! Streaming decoder
//!
//! Turns an unbounded byte stream into a sequence of [`Payload`]s.
//!
//! ## State Machine
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!   ┌──────────────┐  '+' ':' '-' '$' '*' other   ┌──────────┴──┐
//!   │   ReadLine   │ ───────────────────────────▶ │  Dispatch   │
//!   └──────┬───────┘                              └──────┬──────┘
//!          │ transport failure                           │ "+FULLRESYNC..."
//!          ▼                                             ▼
//!   ┌──────────────┐                              ┌─────────────┐
//!   │    Halted    │ ◀─── malformed header ────── │   RawBulk   │
//!   └──────────────┘                              └─────────────┘
//! ```
//!
//! Each call to [`Decoder::next_payload`] yields exactly one payload.
//! Protocol errors are recoverable and decoding resumes at the next line;
//! transport failures, replication header errors and limit faults halt the
//! decoder, after which it yields nothing.

use std::borrow::Cow;
use std::io::Read;
use std::mem;
use std::str::FromStr;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{RespError, Result};
use super::reader::LineReader;
use super::{Payload, Reply};

/// Prefix of the status line that announces a raw snapshot transfer
pub const FULLRESYNC: &str = "FULLRESYNC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Read and dispatch the next line
    ReadLine,

    /// The previous status was FULLRESYNC: read the unterminated snapshot
    RawBulk,

    /// A terminal error was emitted
    Halted,
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_bulk_len: usize,
    max_array_len: usize,
    max_snapshot_len: usize,
}

/// RESP decoder over a blocking byte source
pub struct Decoder<R> {
    reader: LineReader<R>,

    /// Current top-level line, reused across frames
    line: Vec<u8>,

    /// Nested header lines (array elements, snapshot header)
    scratch: Vec<u8>,

    state: State,
    limits: Limits,
}

impl<R: Read> Decoder<R> {
    /// Create a decoder with default limits
    pub fn new(source: R) -> Self {
        Self::with_config(source, &Config::default())
    }

    /// Create a decoder using the buffer size and limits from `config`
    pub fn with_config(source: R, config: &Config) -> Self {
        Self {
            reader: LineReader::with_capacity(config.read_buffer_size, source),
            line: Vec::new(),
            scratch: Vec::new(),
            state: State::ReadLine,
            limits: Limits {
                max_bulk_len: config.max_bulk_len,
                max_array_len: config.max_array_len,
                max_snapshot_len: config.max_snapshot_len,
            },
        }
    }

    /// Whether a terminal error has been emitted
    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// Stop yielding payloads
    pub(crate) fn halt(&mut self) {
        self.state = State::Halted;
    }

    /// Decode the next payload, or `None` once halted
    pub fn next_payload(&mut self) -> Option<Payload> {
        if self.is_halted() {
            return None;
        }
        let payload = self.step();
        if let Err(ref e) = payload {
            if e.is_terminal() {
                self.halt();
            }
        }
        Some(payload)
    }

    fn step(&mut self) -> Result<Reply> {
        if self.state == State::RawBulk {
            self.state = State::ReadLine;
            return self.read_snapshot();
        }

        loop {
            self.reader.read_line(&mut self.line)?;

            let len = self.line.len();
            if len < 3 || self.line[len - 2] != b'\r' {
                // Replication traffic occasionally carries blank lines
                tracing::trace!("Skipping stray line of {} bytes", len);
                continue;
            }
            self.line.truncate(len - 2);

            let line = mem::take(&mut self.line);
            let result = self.dispatch(&line);
            self.line = line;
            return result;
        }
    }

    /// Decode one stripped, non-empty line
    fn dispatch(&mut self, line: &[u8]) -> Result<Reply> {
        let content = &line[1..];
        match line[0] {
            b'+' => {
                let status = lossy(content).into_owned();
                if status.starts_with(FULLRESYNC) {
                    self.state = State::RawBulk;
                }
                Ok(Reply::Status(status))
            }
            b'-' => Ok(Reply::Err(lossy(content).into_owned())),
            b':' => parse_int::<i64>(content).map(Reply::Int).ok_or_else(|| {
                RespError::Protocol(format!("illegal number {}", lossy(content)))
            }),
            b'$' => self.read_bulk(content),
            b'*' => self.read_array(content),
            _ => Ok(inline_command(line)),
        }
    }

    fn read_bulk(&mut self, header: &[u8]) -> Result<Reply> {
        match parse_int::<i64>(header) {
            Some(-1) => Ok(Reply::Bulk(None)),
            Some(len) if len >= 0 => Ok(Reply::Bulk(Some(self.read_bulk_body(len)?))),
            _ => Err(RespError::Protocol(format!(
                "illegal bulk string header: ${}",
                lossy(header)
            ))),
        }
    }

    /// Read `len` payload bytes plus the CRLF that follows them
    fn read_bulk_body(&mut self, len: i64) -> Result<Bytes> {
        let len = checked_len(len, self.limits.max_bulk_len, "bulk length")?;
        let mut body = self.reader.read_exact_vec(len + 2)?;
        body.truncate(len);
        Ok(Bytes::from(body))
    }

    fn read_array(&mut self, header: &[u8]) -> Result<Reply> {
        let count = match parse_int::<i32>(header) {
            Some(n) if n >= 0 => n as i64,
            _ => {
                return Err(RespError::Protocol(format!(
                    "illegal array header {}",
                    lossy(header)
                )))
            }
        };
        if count == 0 {
            return Ok(Reply::EMPTY_MULTI_BULK);
        }
        let count = checked_len(count, self.limits.max_array_len, "array length")?;

        // Exactly `count` slots: the array is either filled completely or dropped
        let mut elements: Vec<Option<Bytes>> = vec![None; count];
        for slot in elements.iter_mut() {
            *slot = Some(self.read_array_element()?);
        }
        Ok(Reply::MultiBulk(elements))
    }

    fn read_array_element(&mut self) -> Result<Bytes> {
        self.reader.read_line(&mut self.scratch)?;

        let line = &self.scratch;
        let len = line.len();
        if len < 4 || line[len - 2] != b'\r' || line[0] != b'$' {
            return Err(RespError::Protocol(format!(
                "illegal bulk string header {}",
                lossy(strip_crlf(line))
            )));
        }
        let size = match parse_int::<i64>(&line[1..len - 2]) {
            Some(n) if n >= -1 => n,
            _ => {
                return Err(RespError::Protocol(format!(
                    "illegal bulk string header {}",
                    lossy(strip_crlf(line))
                )))
            }
        };

        // A null element inside a request array is kept as an empty argument
        if size == -1 {
            return Ok(Bytes::new());
        }
        self.read_bulk_body(size)
    }

    /// Read the snapshot that follows a FULLRESYNC status
    ///
    /// The header is `$<n>` with `n > 0`; the `n` bytes after it are not
    /// followed by CRLF, the next byte belongs to the replicated command stream.
    fn read_snapshot(&mut self) -> Result<Reply> {
        self.reader.read_line(&mut self.scratch)?;

        let header = strip_crlf(&self.scratch);
        let size = match header.split_first() {
            Some((&b'$', digits)) => parse_int::<i64>(digits).filter(|&n| n > 0),
            _ => None,
        };
        let Some(size) = size else {
            return Err(RespError::Replication(format!(
                "illegal bulk header {}",
                lossy(header)
            )));
        };

        let len = checked_len(size, self.limits.max_snapshot_len, "snapshot length")?;
        let body = self.reader.read_exact_vec(len)?;
        tracing::debug!("Read replication snapshot of {} bytes", len);
        Ok(Reply::Bulk(Some(Bytes::from(body))))
    }
}

impl<R: Read> Iterator for Decoder<R> {
    type Item = Payload;

    fn next(&mut self) -> Option<Payload> {
        self.next_payload()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Split a legacy inline command on single spaces, without escaping
fn inline_command(line: &[u8]) -> Reply {
    Reply::MultiBulk(
        line.split(|&b| b == b' ')
            .map(|token| Some(Bytes::copy_from_slice(token)))
            .collect(),
    )
}

/// Convert a non-negative wire length, refusing anything above `limit`
fn checked_len(len: i64, limit: usize, what: &str) -> Result<usize> {
    usize::try_from(len)
        .ok()
        .filter(|&n| n <= limit)
        .ok_or_else(|| RespError::Fault(format!("{} {} exceeds limit {}", what, len, limit)))
}

fn parse_int<T: FromStr>(digits: &[u8]) -> Option<T> {
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn strip_crlf(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r\n").unwrap_or(line)
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
