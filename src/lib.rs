//! # respkv
//!
//! The wire protocol engine of a Redis-compatible key-value server:
//! - Streaming RESP decoder tolerant of partial reads and malformed frames
//! - Raw snapshot sub-mode for the FULLRESYNC replication handshake
//! - Pre-sized, single-allocation reply encoder
//! - Thread-per-connection TCP server with graceful shutdown
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ bytes
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │        LineReader → Decoder (decoder thread)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Payload (zero-capacity channel)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │              Connection → Handler                            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Reply
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Encoder                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RespError, Result};
pub use config::Config;
pub use protocol::{Decoder, Payload, PayloadStream, Reply};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of respkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
