//! Configuration for respkv
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{RespError, Result};

/// Main configuration for a respkv server and its decoders
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Idle timeout for a connection with no incoming bytes (milliseconds, 0 = never)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = never)
    pub write_timeout_ms: u64,

    /// How often blocked accepts and reads check for shutdown (milliseconds)
    pub poll_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Decoder Configuration
    // -------------------------------------------------------------------------
    /// Capacity of the buffered line reader (in bytes)
    pub read_buffer_size: usize,

    /// Largest bulk string accepted before the stream is abandoned (in bytes)
    pub max_bulk_len: usize,

    /// Largest array element count accepted
    pub max_array_len: usize,

    /// Largest replication snapshot accepted after FULLRESYNC (in bytes)
    pub max_snapshot_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:6379".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
            poll_interval_ms: 100,
            read_buffer_size: 16 * 1024,        // 16 KB
            max_bulk_len: 512 * 1024 * 1024,    // 512 MB
            max_array_len: 1024 * 1024,
            max_snapshot_len: u32::MAX as usize,     // ~4 GB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings that would make the server or decoder unusable
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(RespError::Config("max_connections must be positive".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(RespError::Config("poll_interval_ms must be positive".to_string()));
        }
        if self.read_buffer_size == 0 {
            return Err(RespError::Config("read_buffer_size must be positive".to_string()));
        }
        if self.max_bulk_len == 0 || self.max_array_len == 0 || self.max_snapshot_len == 0 {
            return Err(RespError::Config("decoder limits must be positive".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Idle timeout, if one is configured
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Write timeout, if one is configured
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the idle read timeout (in milliseconds, 0 disables it)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds, 0 disables it)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the shutdown polling interval (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the line reader buffer capacity (in bytes)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Set the largest accepted bulk string (in bytes)
    pub fn max_bulk_len(mut self, len: usize) -> Self {
        self.config.max_bulk_len = len;
        self
    }

    /// Set the largest accepted array element count
    pub fn max_array_len(mut self, len: usize) -> Self {
        self.config.max_array_len = len;
        self
    }

    /// Set the largest accepted replication snapshot (in bytes)
    pub fn max_snapshot_len(mut self, len: usize) -> Self {
        self.config.max_snapshot_len = len;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
