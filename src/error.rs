//! Error types for respkv
//!
//! Provides a unified error type for the protocol engine and the session layer.

use thiserror::Error;

/// Result type alias using RespError
pub type Result<T> = std::result::Result<T, RespError>;

/// Unified error type for respkv operations
#[derive(Debug, Error)]
pub enum RespError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// Read/write failure or end of stream on the byte source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Malformed integer, bulk header or array header. Recoverable.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Malformed raw-bulk header after FULLRESYNC
    #[error("replication error: {0}")]
    Replication(String),

    // -------------------------------------------------------------------------
    // Reply Classification Errors
    // -------------------------------------------------------------------------
    #[error("empty reply")]
    EmptyReply,

    /// Error text carried by an `-ERR ...` reply
    #[error("{0}")]
    Reply(String),

    // -------------------------------------------------------------------------
    // Decoder Faults
    // -------------------------------------------------------------------------
    /// Limit violations and panics caught at the decode loop boundary
    #[error("decoder fault: {0}")]
    Fault(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RespError {
    /// Whether this error ends the payload stream it was raised on.
    ///
    /// Only protocol errors are recoverable: the decoder resumes at the next
    /// line after emitting them.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            RespError::Protocol(_) | RespError::EmptyReply | RespError::Reply(_)
        )
    }
}
