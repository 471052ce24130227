//! Protocol codec
//!
//! Encoding and decoding functions for the textual wire protocol.
//!
//! Control lines are ASCII and end in `\n` (`\r\n` is accepted). Payloads
//! are raw bytes framed by the length on the control line, so values may
//! contain newlines or arbitrary binary data.

use std::io::{self, BufRead, Read, Write};

use bytes::Bytes;

use crate::error::{KvError, Result};
use crate::fingerprint::Fingerprint;
use super::{Command, CommandType, Response, Status};

/// Longest control line accepted, including the newline
pub const MAX_LINE_LEN: usize = 4096;

/// Hard cap on response payloads read by a client (16 MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Placeholder written when a response carries no fingerprint
const NO_FINGERPRINT: &str = "-";

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: `VERB key [len [fingerprint]]\n` + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let verb = command.command_type().as_str();

    match command {
        Command::Get { key } | Command::Head { key } | Command::Delete { key } => {
            let mut message = Vec::with_capacity(verb.len() + key.len() + 2);
            message.extend_from_slice(verb.as_bytes());
            message.push(b' ');
            message.extend_from_slice(key);
            message.push(b'\n');
            message
        }
        Command::Put {
            key,
            value,
            if_match,
        } => {
            let mut message = Vec::with_capacity(verb.len() + key.len() + value.len() + 96);
            message.extend_from_slice(verb.as_bytes());
            message.push(b' ');
            message.extend_from_slice(key);
            message.extend_from_slice(format!(" {}", value.len()).as_bytes());
            if let Some(fp) = if_match {
                message.push(b' ');
                message.extend_from_slice(fp.as_str().as_bytes());
            }
            message.push(b'\n');
            message.extend_from_slice(value);
            message
        }
        Command::Ping => format!("{}\n", verb).into_bytes(),
    }
}

/// Decode a command from a complete message
///
/// `max_payload` bounds the value of a write.
pub fn decode_command(bytes: &[u8], max_payload: usize) -> Result<Command> {
    let mut reader = bytes;
    read_command(&mut reader, max_payload)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs. A
/// clean end of stream before any byte of a new command surfaces as an
/// `UnexpectedEof` I/O error.
///
/// Errors that leave the stream positioned at the next command are
/// reported as recoverable (see [`KvError::is_recoverable`]). The line is
/// split on raw bytes, so keys are never decoded; for writes the payload is
/// consumed before the if-match token is validated.
pub fn read_command<R: BufRead>(reader: &mut R, max_payload: usize) -> Result<Command> {
    let line = read_line(reader)?;
    let mut tokens = split_tokens(&line);

    let verb = tokens
        .next()
        .ok_or_else(|| KvError::Protocol("Empty command".to_string()))?;
    let command_type: CommandType = token_str(verb)
        .ok_or_else(|| KvError::Protocol("Command verb is not valid UTF-8".to_string()))?
        .parse()?;

    if command_type == CommandType::Ping {
        return match tokens.next() {
            None => Ok(Command::Ping),
            Some(extra) => Err(KvError::Protocol(format!(
                "PING: unexpected argument '{}'",
                String::from_utf8_lossy(extra)
            ))),
        };
    }

    let key = tokens.next().ok_or(KvError::InvalidKey)?.to_vec();

    match command_type {
        CommandType::Get | CommandType::Head | CommandType::Delete => {
            if let Some(extra) = tokens.next() {
                return Err(KvError::Protocol(format!(
                    "{}: unexpected argument '{}'",
                    command_type.as_str(),
                    String::from_utf8_lossy(extra)
                )));
            }
            Ok(match command_type {
                CommandType::Get => Command::Get { key },
                CommandType::Head => Command::Head { key },
                _ => Command::Delete { key },
            })
        }
        CommandType::Put => {
            let len_token = tokens
                .next()
                .ok_or_else(|| KvError::MalformedLength("missing".to_string()))?;
            let len: usize = token_str(len_token)
                .and_then(|token| token.parse().ok())
                .ok_or_else(|| {
                    KvError::MalformedLength(String::from_utf8_lossy(len_token).into_owned())
                })?;

            if len == 0 {
                return Err(KvError::InvalidLength(len));
            }
            if len > max_payload {
                return Err(KvError::PayloadTooLarge {
                    len,
                    max: max_payload,
                });
            }

            let mut payload = vec![0u8; len];
            reader.read_exact(&mut payload)?;

            let if_match = tokens.next().map(parse_fingerprint).transpose()?;
            if let Some(extra) = tokens.next() {
                return Err(KvError::Protocol(format!(
                    "PUT: unexpected argument '{}'",
                    String::from_utf8_lossy(extra)
                )));
            }

            Ok(Command::Put {
                key,
                value: Bytes::from(payload),
                if_match,
            })
        }
        CommandType::Ping => unreachable!("PING handled above"),
    }
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: `STATUS fingerprint|- len\n` + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    let fingerprint = response
        .fingerprint
        .as_ref()
        .map(Fingerprint::as_str)
        .unwrap_or(NO_FINGERPRINT);

    let header = format!(
        "{} {} {}\n",
        response.status.as_str(),
        fingerprint,
        payload.len()
    );

    let mut message = Vec::with_capacity(header.len() + payload.len());
    message.extend_from_slice(header.as_bytes());
    message.extend_from_slice(payload);
    message
}

/// Decode a response from a complete message
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let mut reader = bytes;
    read_response(&mut reader)
}

/// Read a complete response from a stream
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    let line = String::from_utf8(read_line(reader)?)
        .map_err(|_| KvError::Protocol("Response header is not valid UTF-8".to_string()))?;
    let mut tokens = line.split_ascii_whitespace();

    let (status, fingerprint, len) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(status), Some(fingerprint), Some(len)) => (status, fingerprint, len),
        _ => {
            return Err(KvError::Protocol(format!(
                "Malformed response header: '{}'",
                line
            )))
        }
    };
    if tokens.next().is_some() {
        return Err(KvError::Protocol(format!(
            "Malformed response header: '{}'",
            line
        )));
    }

    let status: Status = status.parse()?;
    let fingerprint = match fingerprint {
        NO_FINGERPRINT => None,
        fp => Some(fp.parse::<Fingerprint>()?),
    };
    let len: usize = len
        .parse()
        .map_err(|_| KvError::Protocol(format!("Invalid response length '{}'", len)))?;

    // Validate payload length
    if len > MAX_PAYLOAD_SIZE {
        return Err(KvError::PayloadTooLarge {
            len,
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let payload = if len > 0 {
        let mut payload = vec![0u8; len];
        reader.read_exact(&mut payload)?;
        Some(Bytes::from(payload))
    } else {
        None
    };

    Ok(Response {
        status,
        fingerprint,
        payload,
    })
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Line Reading
// =============================================================================

/// Read one control line, without its terminator
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut line)?;

    if read == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stream closed").into());
    }
    if line.last() != Some(&b'\n') {
        if read >= MAX_LINE_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("control line exceeds {} bytes", MAX_LINE_LEN),
            )
            .into());
        }
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated control line").into());
    }

    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }

    Ok(line)
}

/// Split a control line on ASCII whitespace, skipping empty tokens
fn split_tokens(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    line.split(u8::is_ascii_whitespace)
        .filter(|token| !token.is_empty())
}

fn token_str(token: &[u8]) -> Option<&str> {
    std::str::from_utf8(token).ok()
}

fn parse_fingerprint(token: &[u8]) -> Result<Fingerprint> {
    token_str(token)
        .ok_or_else(|| KvError::InvalidFingerprint(String::from_utf8_lossy(token).into_owned()))?
        .parse()
}
