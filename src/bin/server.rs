//! respkv Server Binary
//!
//! Starts the TCP server with the basic PING/ECHO handler.

use std::sync::Arc;

use clap::Parser;
use respkv::network::{BasicHandler, Server};
use respkv::Config;
use tracing_subscriber::{fmt, EnvFilter};

/// respkv Server
#[derive(Parser, Debug)]
#[command(name = "respkv-server")]
#[command(about = "RESP protocol server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Close connections idle for this many milliseconds (0 = never)
    #[arg(short = 't', long, default_value = "0")]
    idle_timeout_ms: u64,

    /// Largest accepted bulk string in MB
    #[arg(short = 'b', long, default_value = "512")]
    max_bulk_mb: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,respkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("respkv Server v{}", respkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.idle_timeout_ms)
        .max_bulk_len(args.max_bulk_mb * 1024 * 1024)
        .build();

    let server = match Server::bind(config, Arc::new(BasicHandler)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
