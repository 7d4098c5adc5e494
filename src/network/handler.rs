//! Command handler seam
//!
//! The session layer hands every decoded command to a [`Handler`] and writes
//! back whatever reply it returns. Command semantics live behind this trait.

use bytes::Bytes;

use crate::protocol::Reply;

/// Executes decoded commands
pub trait Handler: Send + Sync {
    /// Execute one command; `args[0]` is the command name
    fn handle(&self, args: &[Bytes]) -> Reply;

    /// Called once when the server has drained all connections
    fn close(&self) {}
}

/// Minimal handler answering `PING` and `ECHO`
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicHandler;

impl Handler for BasicHandler {
    fn handle(&self, args: &[Bytes]) -> Reply {
        let Some((name, rest)) = args.split_first() else {
            return Reply::error("ERR empty command");
        };

        if name.eq_ignore_ascii_case(b"ping") {
            match rest {
                [] => Reply::status("PONG"),
                [message] => Reply::Bulk(Some(message.clone())),
                _ => wrong_arity("ping"),
            }
        } else if name.eq_ignore_ascii_case(b"echo") {
            match rest {
                [message] => Reply::Bulk(Some(message.clone())),
                _ => wrong_arity("echo"),
            }
        } else {
            Reply::error(format!(
                "ERR unknown command '{}'",
                String::from_utf8_lossy(name)
            ))
        }
    }
}

fn wrong_arity(command: &str) -> Reply {
    Reply::error(format!(
        "ERR wrong number of arguments for '{}' command",
        command
    ))
}
