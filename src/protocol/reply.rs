//! Reply definitions
//!
//! The closed set of values that can be written to (or decoded from) the wire.

use bytes::Bytes;

use crate::error::RespError;
use super::codec;

/// Discriminant of a [`Reply`], used where only the kind matters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Bulk,
    MultiBulk,
    MultiRaw,
    Status,
    Int,
    Err,
}

/// A reply value
///
/// Every variant serializes to a self-delimiting frame ending in CRLF. The one
/// exception is the replication snapshot, decoded as a `Bulk` whose bytes were
/// never followed by a terminator on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Binary-safe string; `None` is the null bulk (`$-1`), distinct from empty
    Bulk(Option<Bytes>),

    /// Flat array of bulk-or-null elements
    MultiBulk(Vec<Option<Bytes>>),

    /// Array whose elements are full replies (nesting allowed)
    MultiRaw(Vec<Reply>),

    /// Single-line status text, must not contain CR or LF
    Status(String),

    /// Signed 64-bit integer
    Int(i64),

    /// Error reply, both a value and an error signal
    Err(String),
}

impl Reply {
    /// Canonical empty array (`*0\r\n`)
    pub const EMPTY_MULTI_BULK: Reply = Reply::MultiBulk(Vec::new());

    /// Create a bulk reply from anything byte-like
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(Some(data.into()))
    }

    /// Create the null bulk reply
    pub fn null_bulk() -> Self {
        Reply::Bulk(None)
    }

    /// Create a multi-bulk reply where every element is present
    pub fn multi_bulk<I, B>(items: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Reply::MultiBulk(items.into_iter().map(|b| Some(b.into())).collect())
    }

    pub fn status(text: impl Into<String>) -> Self {
        Reply::Status(text.into())
    }

    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Reply::Err(text.into())
    }

    /// Get the reply kind
    pub fn kind(&self) -> ReplyKind {
        match self {
            Reply::Bulk(_) => ReplyKind::Bulk,
            Reply::MultiBulk(_) => ReplyKind::MultiBulk,
            Reply::MultiRaw(_) => ReplyKind::MultiRaw,
            Reply::Status(_) => ReplyKind::Status,
            Reply::Int(_) => ReplyKind::Int,
            Reply::Err(_) => ReplyKind::Err,
        }
    }

    /// Whether this is the error kind of reply
    pub fn is_error_kind(&self) -> bool {
        self.kind() == ReplyKind::Err
    }

    /// Serialize to wire bytes
    pub fn to_bytes(&self) -> Bytes {
        codec::encode_reply(self)
    }

    /// True iff this reply serializes to exactly `+OK\r\n`
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Status(s) if s == "OK")
    }

    /// True iff the serialized reply starts with `-`
    pub fn is_error(&self) -> bool {
        self.is_error_kind()
    }

    /// Convert an error reply into an error value, `None` for any other reply
    pub fn to_error(&self) -> Option<RespError> {
        match self {
            Reply::Err(text) => Some(RespError::Reply(text.clone())),
            _ => None,
        }
    }
}

impl From<i64> for Reply {
    fn from(value: i64) -> Self {
        Reply::Int(value)
    }
}

impl From<Bytes> for Reply {
    fn from(value: Bytes) -> Self {
        Reply::Bulk(Some(value))
    }
}

impl From<Option<Bytes>> for Reply {
    fn from(value: Option<Bytes>) -> Self {
        Reply::Bulk(value)
    }
}

impl From<Vec<Reply>> for Reply {
    fn from(value: Vec<Reply>) -> Self {
        Reply::MultiRaw(value)
    }
}
