//! Command definitions
//!
//! Represents commands from clients.

use std::str::FromStr;

use bytes::Bytes;

use crate::error::KvError;
use crate::fingerprint::Fingerprint;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Get,
    Head,
    Put,
    Delete,
    Ping,
}

impl CommandType {
    /// Canonical verb written on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Get => "GET",
            CommandType::Head => "HEAD",
            CommandType::Put => "PUT",
            CommandType::Delete => "DELETE",
            CommandType::Ping => "PING",
        }
    }
}

impl FromStr for CommandType {
    type Err = KvError;

    /// Parse a verb, case-insensitively, including aliases
    fn from_str(verb: &str) -> Result<Self, Self::Err> {
        match verb.to_ascii_uppercase().as_str() {
            "GET" => Ok(CommandType::Get),
            "HEAD" => Ok(CommandType::Head),
            "PUT" | "POST" | "PATCH" => Ok(CommandType::Put),
            "DELETE" | "DEL" => Ok(CommandType::Delete),
            "PING" => Ok(CommandType::Ping),
            _ => Err(KvError::Protocol(format!("Unknown command: {}", verb))),
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Get a value and its fingerprint
    Get { key: Vec<u8> },

    /// Get only the fingerprint of a value
    Head { key: Vec<u8> },

    /// Put a value, conditionally when `if_match` is set
    Put {
        key: Vec<u8>,
        value: Bytes,
        if_match: Option<Fingerprint>,
    },

    /// Delete a key
    Delete { key: Vec<u8> },

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Head { .. } => CommandType::Head,
            Command::Put { .. } => CommandType::Put,
            Command::Delete { .. } => CommandType::Delete,
            Command::Ping => CommandType::Ping,
        }
    }

    /// The key this command addresses, if any
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            Command::Get { key }
            | Command::Head { key }
            | Command::Put { key, .. }
            | Command::Delete { key } => Some(key.as_slice()),
            Command::Ping => None,
        }
    }
}
