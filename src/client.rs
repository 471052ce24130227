//! Client
//!
//! Blocking client for the textual protocol.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{KvError, Result};
use crate::fingerprint::Fingerprint;
use crate::protocol::{read_response, write_command, Command, Response, Status};

/// A connection to an etagkv server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Apply a read timeout to responses
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }

    /// Get a value and its fingerprint, `None` if absent
    pub fn get(&mut self, key: &str) -> Result<Option<(Bytes, Fingerprint)>> {
        let response = self.call(&Command::Get {
            key: key_bytes(key)?,
        })?;

        match response.status {
            Status::Ok => {
                let fingerprint = expect_fingerprint(&response)?;
                Ok(Some((response.payload.unwrap_or_default(), fingerprint)))
            }
            Status::NotFound => Ok(None),
            _ => Err(into_error(response)),
        }
    }

    /// Get the fingerprint of a value, `None` if absent
    pub fn head(&mut self, key: &str) -> Result<Option<Fingerprint>> {
        let response = self.call(&Command::Head {
            key: key_bytes(key)?,
        })?;

        match response.status {
            Status::Ok => expect_fingerprint(&response).map(Some),
            Status::NotFound => Ok(None),
            _ => Err(into_error(response)),
        }
    }

    /// Unconditionally write a value, returning its fingerprint
    pub fn put(&mut self, key: &str, value: impl Into<Bytes>) -> Result<Fingerprint> {
        self.write(key, value.into(), None)
    }

    /// Write a value only if the stored value still has fingerprint
    /// `expected`. A rejected write is `KvError::PreconditionFailed`.
    pub fn put_if_match(
        &mut self,
        key: &str,
        value: impl Into<Bytes>,
        expected: &Fingerprint,
    ) -> Result<Fingerprint> {
        self.write(key, value.into(), Some(expected.clone()))
    }

    /// Delete a key
    pub fn delete(&mut self, key: &str) -> Result<()> {
        let response = self.call(&Command::Delete {
            key: key_bytes(key)?,
        })?;

        match response.status {
            Status::Ok => Ok(()),
            _ => Err(into_error(response)),
        }
    }

    /// Ping the server
    pub fn ping(&mut self) -> Result<()> {
        let response = self.call(&Command::Ping)?;
        match response.status {
            Status::Ok => Ok(()),
            _ => Err(into_error(response)),
        }
    }

    fn write(
        &mut self,
        key: &str,
        value: Bytes,
        if_match: Option<Fingerprint>,
    ) -> Result<Fingerprint> {
        if value.is_empty() {
            return Err(KvError::InvalidLength(0));
        }

        let response = self.call(&Command::Put {
            key: key_bytes(key)?,
            value,
            if_match,
        })?;

        match response.status {
            Status::Ok => expect_fingerprint(&response),
            _ => Err(into_error(response)),
        }
    }

    fn call(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }
}

/// Keys travel as single whitespace-free tokens
fn key_bytes(key: &str) -> Result<Vec<u8>> {
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(KvError::InvalidKey);
    }
    Ok(key.as_bytes().to_vec())
}

fn expect_fingerprint(response: &Response) -> Result<Fingerprint> {
    response
        .fingerprint
        .clone()
        .ok_or_else(|| KvError::Protocol("OK response without fingerprint".to_string()))
}

/// Map a non-OK response back onto the error it reports
fn into_error(response: Response) -> KvError {
    match response.status {
        Status::NotFound => KvError::KeyNotFound,
        Status::Conflict => KvError::PreconditionFailed,
        Status::BadRequest => match response.message().as_str() {
            "invalid key" => KvError::InvalidKey,
            message => KvError::Protocol(message.to_string()),
        },
        _ => KvError::Network(format!("server error: {}", response.message())),
    }
}
