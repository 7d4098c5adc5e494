//! respkv CLI Client
//!
//! Sends one command to a RESP server and prints the reply.

use std::io::Write;
use std::net::TcpStream;
use std::process::ExitCode;

use bytes::Bytes;
use clap::Parser;
use respkv::protocol::{write_reply, Decoder, Reply};
use respkv::Result;

/// respkv CLI
#[derive(Parser, Debug)]
#[command(name = "respkv-cli")]
#[command(about = "CLI for RESP servers")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    /// Send the command as a space-separated inline line instead of an array
    #[arg(long)]
    inline: bool,

    /// Command and arguments, e.g. `PING` or `ECHO hello`
    #[arg(required = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the server answered without an error reply
fn run(args: &Args) -> Result<bool> {
    let mut stream = TcpStream::connect(&args.server)?;

    if args.inline {
        stream.write_all(args.command.join(" ").as_bytes())?;
        stream.write_all(b"\r\n")?;
        stream.flush()?;
    } else {
        let request = Reply::multi_bulk(args.command.iter().map(|a| Bytes::from(a.clone())));
        write_reply(&mut stream, &request)?;
    }

    let mut decoder = Decoder::new(stream);
    let reply = match decoder.next_payload() {
        Some(payload) => payload?,
        None => return Ok(false),
    };

    if let Some(err) = reply.to_error() {
        println!("(error) {}", err);
        return Ok(false);
    }
    print_reply(&reply, 0);
    Ok(true)
}

/// Print a reply the way redis-cli does
fn print_reply(reply: &Reply, indent: usize) {
    let pad = " ".repeat(indent);
    match reply {
        Reply::Status(s) => println!("{}", s),
        Reply::Err(s) => println!("(error) {}", s),
        Reply::Int(n) => println!("(integer) {}", n),
        Reply::Bulk(None) => println!("(nil)"),
        Reply::Bulk(Some(b)) => println!("\"{}\"", String::from_utf8_lossy(b)),
        Reply::MultiBulk(items) if items.is_empty() => println!("(empty array)"),
        Reply::MultiBulk(items) => {
            for (i, item) in items.iter().enumerate() {
                let prefix = if i == 0 { String::new() } else { pad.clone() };
                match item {
                    Some(b) => println!("{}{}) \"{}\"", prefix, i + 1, String::from_utf8_lossy(b)),
                    None => println!("{}{}) (nil)", prefix, i + 1),
                }
            }
        }
        Reply::MultiRaw(items) if items.is_empty() => println!("(empty array)"),
        Reply::MultiRaw(items) => {
            for (i, item) in items.iter().enumerate() {
                let prefix = if i == 0 { String::new() } else { pad.clone() };
                print!("{}{}) ", prefix, i + 1);
                print_reply(item, indent + 3);
            }
        }
    }
}
