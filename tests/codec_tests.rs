//! Codec Tests
//!
//! Tests for command and response encoding/decoding over the textual
//! protocol.

use std::io::{BufReader, Cursor};

use bytes::Bytes;
use etagkv::fingerprint::{Fingerprint, Fingerprinter, Sha256Fingerprinter};
use etagkv::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, Command, Response, Status, MAX_LINE_LEN,
};
use etagkv::KvError;

const MAX: usize = 64;

fn fp(value: &[u8]) -> Fingerprint {
    Sha256Fingerprinter::new().fingerprint(value)
}

// =============================================================================
// Command Decoding Tests
// =============================================================================

#[test]
fn test_decode_get() {
    let cmd = decode_command(b"GET foo\n", MAX).unwrap();
    assert_eq!(cmd, Command::Get { key: b"foo".to_vec() });
}

#[test]
fn test_decode_is_case_insensitive_and_accepts_crlf() {
    let cmd = decode_command(b"get foo\r\n", MAX).unwrap();
    assert_eq!(cmd, Command::Get { key: b"foo".to_vec() });
}

#[test]
fn test_decode_head_and_delete_aliases() {
    assert_eq!(
        decode_command(b"HEAD foo\n", MAX).unwrap(),
        Command::Head { key: b"foo".to_vec() }
    );
    assert_eq!(
        decode_command(b"DELETE foo\n", MAX).unwrap(),
        Command::Delete { key: b"foo".to_vec() }
    );
    assert_eq!(
        decode_command(b"DEL foo\n", MAX).unwrap(),
        Command::Delete { key: b"foo".to_vec() }
    );
}

#[test]
fn test_decode_put_with_binary_payload() {
    let cmd = decode_command(b"PUT foo 5\na\nb\0c", MAX).unwrap();
    assert_eq!(
        cmd,
        Command::Put {
            key: b"foo".to_vec(),
            value: Bytes::from_static(b"a\nb\0c"),
            if_match: None,
        }
    );
}

#[test]
fn test_decode_put_aliases() {
    for verb in ["POST", "PATCH", "put"] {
        let message = format!("{} foo 3\nbar", verb);
        match decode_command(message.as_bytes(), MAX).unwrap() {
            Command::Put { key, value, .. } => {
                assert_eq!(key, b"foo");
                assert_eq!(value, Bytes::from_static(b"bar"));
            }
            other => panic!("Expected PUT command, got {:?}", other),
        }
    }
}

#[test]
fn test_decode_put_with_if_match() {
    let message = format!("PUT foo 3 {}\nbaz", fp(b"bar"));
    let cmd = decode_command(message.as_bytes(), MAX).unwrap();

    match cmd {
        Command::Put { if_match, .. } => assert_eq!(if_match, Some(fp(b"bar"))),
        other => panic!("Expected PUT command, got {:?}", other),
    }
}

#[test]
fn test_decode_ping() {
    assert_eq!(decode_command(b"PING\n", MAX).unwrap(), Command::Ping);
}

// =============================================================================
// Command Error Tests
// =============================================================================

#[test]
fn test_decode_missing_key() {
    let result = decode_command(b"GET\n", MAX);
    assert!(matches!(result, Err(KvError::InvalidKey)));

    let result = decode_command(b"PUT\n", MAX);
    assert!(matches!(result, Err(KvError::InvalidKey)));
}

#[test]
fn test_decode_unknown_verb() {
    let result = decode_command(b"FROB foo\n", MAX);
    assert!(matches!(result, Err(KvError::Protocol(_))));
}

#[test]
fn test_decode_empty_line() {
    let result = decode_command(b"\n", MAX);
    assert!(matches!(result, Err(KvError::Protocol(_))));
}

#[test]
fn test_decode_extra_arguments() {
    let result = decode_command(b"GET foo bar\n", MAX);
    assert!(matches!(result, Err(KvError::Protocol(_))));

    let result = decode_command(b"PING now\n", MAX);
    assert!(matches!(result, Err(KvError::Protocol(_))));
}

#[test]
fn test_decode_put_zero_length() {
    let result = decode_command(b"PUT foo 0\n", MAX);
    assert!(matches!(result, Err(KvError::InvalidLength(0))));
}

#[test]
fn test_decode_put_oversized() {
    let result = decode_command(b"PUT foo 65\n", MAX);
    match result {
        Err(e @ KvError::PayloadTooLarge { len: 65, max: MAX }) => assert!(!e.is_recoverable()),
        other => panic!("Expected PayloadTooLarge, got {:?}", other),
    }
}

#[test]
fn test_decode_put_bad_length() {
    match decode_command(b"PUT foo abc\nxyz", MAX) {
        Err(e @ KvError::MalformedLength(_)) => assert!(!e.is_recoverable()),
        other => panic!("Expected MalformedLength, got {:?}", other),
    }

    let result = decode_command(b"PUT foo\n", MAX);
    assert!(matches!(result, Err(KvError::MalformedLength(_))));
}

#[test]
fn test_decode_put_truncated_payload() {
    match decode_command(b"PUT foo 10\nshort", MAX) {
        Err(KvError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("Expected UnexpectedEof, got {:?}", other),
    }
}

#[test]
fn test_bad_fingerprint_consumes_payload() {
    // The payload is read before the if-match token is checked, so the
    // next command on the stream is still aligned
    let mut reader: &[u8] = b"PUT foo 3 not-hex\nbarGET foo\n";

    let result = read_command(&mut reader, MAX);
    match result {
        Err(e @ KvError::InvalidFingerprint(_)) => assert!(e.is_recoverable()),
        other => panic!("Expected InvalidFingerprint, got {:?}", other),
    }

    let next = read_command(&mut reader, MAX).unwrap();
    assert_eq!(next, Command::Get { key: b"foo".to_vec() });
}

#[test]
fn test_binary_key_keeps_payload_framed() {
    let mut reader: &[u8] = b"PUT k\xff 14\nDELETE victim\nPING\n";

    let cmd = read_command(&mut reader, MAX).unwrap();
    assert_eq!(
        cmd,
        Command::Put {
            key: b"k\xff".to_vec(),
            value: Bytes::from_static(b"DELETE victim\n"),
            if_match: None,
        }
    );

    // The value bytes were not run as a command
    assert_eq!(read_command(&mut reader, MAX).unwrap(), Command::Ping);
}

#[test]
fn test_binary_fingerprint_consumes_payload() {
    let mut reader: &[u8] = b"PUT foo 14 \xffab\nDELETE victim\nPING\n";

    match read_command(&mut reader, MAX) {
        Err(e @ KvError::InvalidFingerprint(_)) => assert!(e.is_recoverable()),
        other => panic!("Expected InvalidFingerprint, got {:?}", other),
    }
    assert_eq!(read_command(&mut reader, MAX).unwrap(), Command::Ping);
}

#[test]
fn test_binary_length_is_unrecoverable() {
    match decode_command(b"PUT foo 1\xff\nxyz", MAX) {
        Err(e @ KvError::MalformedLength(_)) => assert!(!e.is_recoverable()),
        other => panic!("Expected MalformedLength, got {:?}", other),
    }
}

#[test]
fn test_binary_key_on_read_commands() {
    assert_eq!(
        decode_command(b"GET \x00\xfe\n", MAX).unwrap(),
        Command::Get { key: vec![0x00, 0xfe] }
    );
}

#[test]
fn test_overlong_line_is_unrecoverable() {
    let mut message = b"GET ".to_vec();
    message.extend(std::iter::repeat(b'k').take(MAX_LINE_LEN));
    message.push(b'\n');

    let err = decode_command(&message, MAX).unwrap_err();
    assert!(!err.is_recoverable());
}

#[test]
fn test_eof_between_commands() {
    let mut reader: &[u8] = b"PING\n";
    assert_eq!(read_command(&mut reader, MAX).unwrap(), Command::Ping);

    match read_command(&mut reader, MAX) {
        Err(KvError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("Expected UnexpectedEof, got {:?}", other),
    }
}

// =============================================================================
// Command Encoding Tests
// =============================================================================

#[test]
fn test_encode_put_layout() {
    let cmd = Command::Put {
        key: b"foo".to_vec(),
        value: Bytes::from_static(b"bar"),
        if_match: Some(fp(b"old")),
    };

    let expected = format!("PUT foo 3 {}\nbar", fp(b"old"));
    assert_eq!(encode_command(&cmd), expected.into_bytes());
}

#[test]
fn test_encode_simple_commands() {
    assert_eq!(encode_command(&Command::Get { key: b"k".to_vec() }), b"GET k\n");
    assert_eq!(encode_command(&Command::Head { key: b"k".to_vec() }), b"HEAD k\n");
    assert_eq!(
        encode_command(&Command::Delete { key: b"k".to_vec() }),
        b"DELETE k\n"
    );
    assert_eq!(encode_command(&Command::Ping), b"PING\n");
}

#[test]
fn test_stream_multiple_commands() {
    let commands = vec![
        Command::Put {
            key: b"a".to_vec(),
            value: Bytes::from_static(b"line1\nline2"),
            if_match: None,
        },
        Command::Get { key: b"a".to_vec() },
        Command::Ping,
        Command::Delete { key: b"a".to_vec() },
    ];

    let mut buffer = Vec::new();
    for cmd in &commands {
        write_command(&mut buffer, cmd).unwrap();
    }

    let mut reader = BufReader::new(Cursor::new(buffer));
    for expected in &commands {
        assert_eq!(&read_command(&mut reader, MAX).unwrap(), expected);
    }
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_encode_ok_response_layout() {
    let response = Response::ok(Some(fp(b"bar")), Some(Bytes::from_static(b"bar")));
    let expected = format!("OK {} 3\nbar", fp(b"bar"));
    assert_eq!(encode_response(&response), expected.into_bytes());
}

#[test]
fn test_encode_empty_response_layout() {
    assert_eq!(encode_response(&Response::ok(None, None)), b"OK - 0\n");
}

#[test]
fn test_decode_error_responses() {
    let response = decode_response(&encode_response(&Response::conflict())).unwrap();
    assert_eq!(response.status, Status::Conflict);
    assert_eq!(response.fingerprint, None);
    assert_eq!(response.message(), "fingerprint mismatch");

    let response = decode_response(b"NOT_FOUND - 9\nnot found").unwrap();
    assert_eq!(response.status, Status::NotFound);

    let response = decode_response(b"BAD_REQUEST - 14\ninvalid length").unwrap();
    assert_eq!(response.status, Status::BadRequest);
    assert_eq!(response.message(), "invalid length");
}

#[test]
fn test_decode_malformed_response() {
    assert!(matches!(
        decode_response(b"OK\n"),
        Err(KvError::Protocol(_))
    ));
    assert!(matches!(
        decode_response(b"MAYBE - 0\n"),
        Err(KvError::Protocol(_))
    ));
    assert!(matches!(
        decode_response(b"OK - many\n"),
        Err(KvError::Protocol(_))
    ));
}

#[test]
fn test_stream_responses() {
    let responses = vec![
        Response::ok(Some(fp(b"v")), Some(Bytes::from_static(b"v"))),
        Response::not_found(),
        Response::bad_request("invalid key"),
    ];

    let mut buffer = Vec::new();
    for response in &responses {
        write_response(&mut buffer, response).unwrap();
    }

    let mut reader: &[u8] = &buffer;
    for expected in &responses {
        assert_eq!(&read_response(&mut reader).unwrap(), expected);
    }
}
