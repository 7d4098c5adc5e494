//! Protocol Module
//!
//! RESP wire protocol: reply values, the pre-sized encoder, and the
//! streaming decoder used for both client traffic and replication.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────────────────┬────────┬─────────────────────────┐
//! │Prefix (1)│   Header / content   │  CRLF  │ Body (bulk only) + CRLF │
//! └──────────┴──────────────────────┴────────┴─────────────────────────┘
//! ```
//!
//! ### Prefixes
//! - `+`: status          - `+OK`
//! - `-`: error           - `-ERR unknown command`
//! - `:`: integer         - `:1000`
//! - `$`: bulk string     - `$5` then `hello`, or `$-1` for null
//! - `*`: array           - `*2` then two elements
//! - anything else: inline command, split on spaces
//!
//! ### Replication
//! `+FULLRESYNC <id> <offset>` is followed by `$<n>` and exactly `n` snapshot
//! bytes with no trailing CRLF.

mod reply;
mod codec;
pub mod reader;
mod decoder;
mod stream;

pub use reply::{Reply, ReplyKind};
pub use codec::{
    encode_reply, encode_into, encoded_len, write_reply,
    is_ok, is_error, to_error,
    CRLF, NULL_BULK, OK_REPLY,
};
pub use reader::LineReader;
pub use decoder::{Decoder, FULLRESYNC};
pub use stream::{parse_stream, Payload, PayloadStream, RecvTimeoutError};
