//! Decoder Tests
//!
//! Tests for the streaming decoder state machine.

use std::io::{Cursor, ErrorKind};

use bytes::Bytes;
use respkv::protocol::{encode_reply, Decoder, Payload, Reply};
use respkv::{Config, RespError};

// =============================================================================
// Helper Functions
// =============================================================================

fn decode_all(input: &[u8]) -> Vec<Payload> {
    Decoder::new(Cursor::new(input.to_vec())).collect()
}

/// Decode everything and drop the terminal end-of-stream error
fn decode_replies(input: &[u8]) -> Vec<Reply> {
    let mut payloads = decode_all(input);
    match payloads.pop() {
        Some(Err(RespError::Io(e))) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
        other => panic!("Expected terminal EOF, got {:?}", other),
    }
    payloads
        .into_iter()
        .map(|p| p.expect("unexpected decode error"))
        .collect()
}

fn bulk(data: &str) -> Reply {
    Reply::Bulk(Some(Bytes::copy_from_slice(data.as_bytes())))
}

// =============================================================================
// Basic Frame Tests
// =============================================================================

#[test]
fn test_decode_mixed_sequence() {
    let replies = decode_replies(b"+OK\r\n:5\r\n$3\r\nfoo\r\n*0\r\n");

    assert_eq!(
        replies,
        vec![
            Reply::status("OK"),
            Reply::Int(5),
            bulk("foo"),
            Reply::MultiBulk(vec![]),
        ]
    );
}

#[test]
fn test_decode_error_reply() {
    let replies = decode_replies(b"-ERR unknown command 'foo'\r\n");
    assert_eq!(replies, vec![Reply::error("ERR unknown command 'foo'")]);
}

#[test]
fn test_decode_negative_integer() {
    assert_eq!(decode_replies(b":-42\r\n"), vec![Reply::Int(-42)]);
}

#[test]
fn test_null_and_empty_bulk_distinguishable() {
    let replies = decode_replies(b"$-1\r\n$0\r\n\r\n");
    assert_eq!(replies, vec![Reply::Bulk(None), Reply::Bulk(Some(Bytes::new()))]);
    assert_ne!(replies[0], replies[1]);
}

#[test]
fn test_decode_binary_bulk() {
    let replies = decode_replies(b"$4\r\n\r\n\x00\xff\r\n");
    assert_eq!(replies, vec![Reply::Bulk(Some(Bytes::from_static(b"\r\n\x00\xff")))]);
}

#[test]
fn test_decode_multi_bulk() {
    let replies = decode_replies(b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n");
    assert_eq!(replies, vec![Reply::multi_bulk(["SET", "key", "value"])]);
}

#[test]
fn test_null_element_becomes_empty() {
    let replies = decode_replies(b"*2\r\n$-1\r\n$1\r\na\r\n");
    assert_eq!(
        replies,
        vec![Reply::MultiBulk(vec![Some(Bytes::new()), Some(Bytes::from("a"))])]
    );
}

#[test]
fn test_decode_inline_command() {
    let replies = decode_replies(b"SET key value\r\n");
    assert_eq!(replies, vec![Reply::multi_bulk(["SET", "key", "value"])]);
}

#[test]
fn test_inline_split_on_single_spaces() {
    let replies = decode_replies(b"GET  k\r\n");
    assert_eq!(replies, vec![Reply::multi_bulk(["GET", "", "k"])]);
}

#[test]
fn test_stray_lines_skipped() {
    // Blank lines, bare LF and LF without CR are discarded silently
    let replies = decode_replies(b"\r\n\n+A\nX\r\n:1\r\n");
    assert_eq!(
        replies,
        vec![Reply::multi_bulk(["X"]), Reply::Int(1)]
    );
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_round_trip_literal_frames() {
    let frames: Vec<&[u8]> = vec![
        b"+status\r\n",
        b"-msg\r\n",
        b":12345\r\n",
        b"$-1\r\n",
        b"$0\r\n\r\n",
        b"$5\r\nhello\r\n",
        b"*0\r\n",
        b"*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n",
    ];

    for frame in frames {
        let replies = decode_replies(frame);
        assert_eq!(replies.len(), 1, "frame {:?}", String::from_utf8_lossy(frame));
        assert_eq!(&encode_reply(&replies[0])[..], frame);
    }
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_illegal_number_is_recoverable() {
    let payloads = decode_all(b":abc\r\n:7\r\n");

    assert_eq!(payloads.len(), 3);
    match &payloads[0] {
        Err(RespError::Protocol(msg)) => assert_eq!(msg, "illegal number abc"),
        other => panic!("Expected protocol error, got {:?}", other),
    }
    assert_eq!(payloads[1].as_ref().unwrap(), &Reply::Int(7));
    assert!(matches!(payloads[2], Err(RespError::Io(_))));
}

#[test]
fn test_illegal_bulk_header_is_recoverable() {
    let payloads = decode_all(b"$-2\r\n$x\r\n+OK\r\n");

    assert!(matches!(payloads[0], Err(RespError::Protocol(_))));
    assert!(matches!(payloads[1], Err(RespError::Protocol(_))));
    assert_eq!(payloads[2].as_ref().unwrap(), &Reply::ok());
    assert_eq!(payloads.len(), 4);
}

#[test]
fn test_illegal_array_header_is_recoverable() {
    let payloads = decode_all(b"*-1\r\n*99999999999\r\n:1\r\n");

    assert!(matches!(payloads[0], Err(RespError::Protocol(_))));
    assert!(matches!(payloads[1], Err(RespError::Protocol(_))));
    assert_eq!(payloads[2].as_ref().unwrap(), &Reply::Int(1));
}

#[test]
fn test_malformed_array_element_abandons_array() {
    let payloads = decode_all(b"*2\r\n$3\r\nfoo\r\nBADLINE\r\n");

    let errors = payloads
        .iter()
        .filter(|p| matches!(p, Err(RespError::Protocol(_))))
        .count();
    assert_eq!(errors, 1);
    assert!(payloads
        .iter()
        .all(|p| !matches!(p, Ok(Reply::MultiBulk(_)))));
    assert!(matches!(payloads.last(), Some(Err(RespError::Io(_)))));
    assert_eq!(payloads.len(), 2);
}

#[test]
fn test_decoding_resumes_after_abandoned_array() {
    let payloads = decode_all(b"*3\r\n$1\r\na\r\n:2\r\n$1\r\nb\r\n+OK\r\n");

    // ":2" breaks the array; the rest is read as top-level frames
    assert!(matches!(payloads[0], Err(RespError::Protocol(_))));
    assert_eq!(payloads[1].as_ref().unwrap(), &bulk("b"));
    assert_eq!(payloads[2].as_ref().unwrap(), &Reply::ok());
}

#[test]
fn test_truncated_bulk_is_terminal() {
    let mut decoder = Decoder::new(Cursor::new(b"$10\r\nabc".to_vec()));

    match decoder.next_payload() {
        Some(Err(RespError::Io(e))) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
        other => panic!("Expected transport error, got {:?}", other),
    }
    assert!(decoder.is_halted());
    assert!(decoder.next_payload().is_none());
    assert!(decoder.next_payload().is_none());
}

#[test]
fn test_truncated_array_is_terminal() {
    let payloads = decode_all(b"*2\r\n$3\r\nfoo\r\n");
    assert_eq!(payloads.len(), 1);
    assert!(matches!(payloads[0], Err(RespError::Io(_))));
}

#[test]
fn test_empty_stream_yields_single_error() {
    let payloads = decode_all(b"");
    assert_eq!(payloads.len(), 1);
    assert!(payloads[0].as_ref().unwrap_err().is_terminal());
}

// =============================================================================
// Replication Tests
// =============================================================================

#[test]
fn test_fullresync_snapshot() {
    let mut decoder = Decoder::new(Cursor::new(b"+FULLRESYNC id 0\r\n$5\r\nHELLO".to_vec()));

    assert_eq!(
        decoder.next_payload().unwrap().unwrap(),
        Reply::status("FULLRESYNC id 0")
    );
    match decoder.next_payload().unwrap().unwrap() {
        Reply::Bulk(Some(body)) => assert_eq!(&body[..], b"HELLO"),
        other => panic!("Expected snapshot bulk, got {:?}", other),
    }
    // Nothing was expected after the snapshot: the next read hits end of stream
    assert!(matches!(decoder.next_payload(), Some(Err(RespError::Io(_)))));
}

#[test]
fn test_snapshot_followed_by_command_stream() {
    let input = b"+FULLRESYNC abc 42\r\n$4\r\nRDB!*1\r\n$4\r\nPING\r\n";
    let replies = decode_replies(input);

    assert_eq!(
        replies,
        vec![
            Reply::status("FULLRESYNC abc 42"),
            bulk("RDB!"),
            Reply::multi_bulk(["PING"]),
        ]
    );
}

#[test]
fn test_snapshot_may_contain_crlf() {
    let replies = decode_replies(b"+FULLRESYNC x 1\r\n$4\r\n\r\n\r\n:3\r\n");
    assert_eq!(replies[1], bulk("\r\n\r\n"));
    assert_eq!(replies[2], Reply::Int(3));
}

#[test]
fn test_bad_snapshot_header_is_terminal() {
    for header in [&b"$0\r\n"[..], b"$-1\r\n", b"$abc\r\n", b"HELLO\r\n"] {
        let mut input = b"+FULLRESYNC id 0\r\n".to_vec();
        input.extend_from_slice(header);
        input.extend_from_slice(b"+OK\r\n");

        let payloads = decode_all(&input);
        assert_eq!(payloads.len(), 2, "header {:?}", String::from_utf8_lossy(header));
        assert!(matches!(payloads[1], Err(RespError::Replication(_))));
    }
}

#[test]
fn test_truncated_snapshot_is_terminal() {
    let payloads = decode_all(b"+FULLRESYNC id 0\r\n$10\r\nabc");
    assert_eq!(payloads.len(), 2);
    assert!(matches!(payloads[1], Err(RespError::Io(_))));
}

// =============================================================================
// Limit Tests
// =============================================================================

#[test]
fn test_bulk_over_limit_is_fault() {
    let config = Config::builder().max_bulk_len(4).build();
    let mut decoder = Decoder::with_config(Cursor::new(b"$4\r\nabcd\r\n$5\r\nabcde\r\n".to_vec()), &config);

    assert_eq!(decoder.next_payload().unwrap().unwrap(), bulk("abcd"));
    assert!(matches!(decoder.next_payload(), Some(Err(RespError::Fault(_)))));
    assert!(decoder.next_payload().is_none());
}

#[test]
fn test_array_over_limit_is_fault() {
    let config = Config::builder().max_array_len(2).build();
    let payloads: Vec<Payload> =
        Decoder::with_config(Cursor::new(b"*3\r\n".to_vec()), &config).collect();

    assert_eq!(payloads.len(), 1);
    assert!(matches!(payloads[0], Err(RespError::Fault(_))));
}

#[test]
fn test_snapshot_over_limit_is_fault() {
    let config = Config::builder().max_snapshot_len(3).build();
    let payloads: Vec<Payload> = Decoder::with_config(
        Cursor::new(b"+FULLRESYNC id 0\r\n$5\r\nHELLO".to_vec()),
        &config,
    )
    .collect();

    assert_eq!(payloads.len(), 2);
    assert!(matches!(payloads[1], Err(RespError::Fault(_))));
}
