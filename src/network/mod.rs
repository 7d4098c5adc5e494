//! Network Module
//!
//! TCP server and client session handling.
//!
//! ## Architecture
//! - Single acceptor thread polling a shutdown token
//! - One thread per connection, plus one decoder thread feeding it
//! - Commands routed through a [`Handler`]

mod server;
mod connection;
mod handler;
mod shutdown;

pub use server::Server;
pub use connection::Connection;
pub use handler::{BasicHandler, Handler};
pub use shutdown::{CancellableStream, ShutdownToken};
