//! Protocol codec
//!
//! Encoding functions for the wire protocol, plus the helpers a client uses
//! to classify raw replies.
//!
//! ## Wire Format
//!
//! ```text
//! +OK\r\n                         Status
//! -ERR message\r\n                Err
//! :1000\r\n                       Int
//! $-1\r\n                         null Bulk
//! $5\r\nhello\r\n                 Bulk
//! *2\r\n$3\r\nfoo\r\n$-1\r\n      MultiBulk (second element null)
//! *2\r\n*1\r\n$1\r\na\r\n:1\r\n   MultiRaw (children are full replies)
//! ```
//!
//! Every reply is measured before it is written: [`encoded_len`] computes the
//! exact output size, so [`encode_reply`] allocates once and never grows.

use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{RespError, Result};
use super::Reply;

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Wire form of the null bulk string
pub const NULL_BULK: &[u8] = b"$-1\r\n";

/// Wire form of the `OK` status
pub const OK_REPLY: &[u8] = b"+OK\r\n";

// =============================================================================
// Measuring
// =============================================================================

/// Number of decimal digits in `value`
pub fn digits(mut value: u64) -> usize {
    let mut count = 1;
    while value >= 10 {
        value /= 10;
        count += 1;
    }
    count
}

/// Number of bytes `value` takes when written in decimal, sign included
fn signed_digits(value: i64) -> usize {
    digits(value.unsigned_abs()) + usize::from(value < 0)
}

/// Size of one bulk element: `$<len>\r\n<data>\r\n`, or `$-1\r\n` when absent
fn bulk_len(data: Option<&Bytes>) -> usize {
    match data {
        None => 3 + 2,
        Some(b) => 1 + digits(b.len() as u64) + 2 + b.len() + 2,
    }
}

/// Exact number of bytes `reply` serializes to
pub fn encoded_len(reply: &Reply) -> usize {
    match reply {
        Reply::Bulk(data) => bulk_len(data.as_ref()),
        Reply::MultiBulk(elements) => {
            let header = 1 + digits(elements.len() as u64) + 2;
            elements.iter().fold(header, |acc, e| acc + bulk_len(e.as_ref()))
        }
        Reply::MultiRaw(replies) => {
            let header = 1 + digits(replies.len() as u64) + 2;
            replies.iter().fold(header, |acc, r| acc + encoded_len(r))
        }
        Reply::Status(text) | Reply::Err(text) => 1 + text.len() + 2,
        Reply::Int(value) => 1 + signed_digits(*value) + 2,
    }
}

// =============================================================================
// Writing
// =============================================================================

/// Append the decimal form of `value` without going through a `String`
fn put_u64(out: &mut BytesMut, mut value: u64) {
    let mut buf = [0u8; 20];
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    out.put_slice(&buf[pos..]);
}

fn put_i64(out: &mut BytesMut, value: i64) {
    if value < 0 {
        out.put_u8(b'-');
    }
    put_u64(out, value.unsigned_abs());
}

fn put_bulk(out: &mut BytesMut, data: Option<&Bytes>) {
    match data {
        None => out.put_slice(NULL_BULK),
        Some(b) => {
            out.put_u8(b'$');
            put_u64(out, b.len() as u64);
            out.put_slice(CRLF);
            out.put_slice(b);
            out.put_slice(CRLF);
        }
    }
}

fn put_array_header(out: &mut BytesMut, count: usize) {
    out.put_u8(b'*');
    put_u64(out, count as u64);
    out.put_slice(CRLF);
}

/// Append the wire form of `reply` to `out`
///
/// `out` is not reserved here; callers that care about a single allocation
/// reserve [`encoded_len`] bytes first, as [`encode_reply`] does.
pub fn encode_into(reply: &Reply, out: &mut BytesMut) {
    match reply {
        Reply::Bulk(data) => put_bulk(out, data.as_ref()),
        Reply::MultiBulk(elements) => {
            put_array_header(out, elements.len());
            for element in elements {
                put_bulk(out, element.as_ref());
            }
        }
        Reply::MultiRaw(replies) => {
            put_array_header(out, replies.len());
            for child in replies {
                encode_into(child, out);
            }
        }
        Reply::Status(text) => {
            out.put_u8(b'+');
            out.put_slice(text.as_bytes());
            out.put_slice(CRLF);
        }
        Reply::Int(value) => {
            out.put_u8(b':');
            put_i64(out, *value);
            out.put_slice(CRLF);
        }
        Reply::Err(text) => {
            out.put_u8(b'-');
            out.put_slice(text.as_bytes());
            out.put_slice(CRLF);
        }
    }
}

/// Encode a reply into a buffer allocated once at its exact size
pub fn encode_reply(reply: &Reply) -> Bytes {
    let len = encoded_len(reply);
    let mut out = BytesMut::with_capacity(len);
    encode_into(reply, &mut out);
    debug_assert_eq!(out.len(), len);
    out.freeze()
}

/// Write a reply to a stream
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<()> {
    let bytes = encode_reply(reply);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Raw Reply Classification
// =============================================================================

/// True iff `raw` is exactly `+OK\r\n`
pub fn is_ok(raw: &[u8]) -> bool {
    raw == OK_REPLY
}

/// True iff `raw` starts with the error prefix `-`
pub fn is_error(raw: &[u8]) -> bool {
    raw.first() == Some(&b'-')
}

/// Classify a raw reply as an error
///
/// - empty input: [`RespError::EmptyReply`]
/// - `-<text>\r\n`: [`RespError::Reply`] carrying `<text>`
/// - anything else: `None`
pub fn to_error(raw: &[u8]) -> Option<RespError> {
    match raw.split_first() {
        None => Some(RespError::EmptyReply),
        Some((&b'-', rest)) => {
            let text = rest.strip_suffix(CRLF).unwrap_or(rest);
            Some(RespError::Reply(String::from_utf8_lossy(text).into_owned()))
        }
        Some(_) => None,
    }
}
