//! Response definitions
//!
//! Represents responses to clients.

use std::str::FromStr;

use bytes::Bytes;

use crate::error::KvError;
use crate::fingerprint::Fingerprint;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    Conflict,
    BadRequest,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::NotFound => "NOT_FOUND",
            Status::Conflict => "CONFLICT",
            Status::BadRequest => "BAD_REQUEST",
            Status::Error => "ERROR",
        }
    }
}

impl FromStr for Status {
    type Err = KvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(Status::Ok),
            "NOT_FOUND" => Ok(Status::NotFound),
            "CONFLICT" => Ok(Status::Conflict),
            "BAD_REQUEST" => Ok(Status::BadRequest),
            "ERROR" => Ok(Status::Error),
            _ => Err(KvError::Protocol(format!("Unknown response status: {}", s))),
        }
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Fingerprint of the value read or written
    pub fingerprint: Option<Fingerprint>,

    /// Optional payload (value for GET, message for errors)
    pub payload: Option<Bytes>,
}

impl Response {
    /// Create an OK response
    pub fn ok(fingerprint: Option<Fingerprint>, payload: Option<Bytes>) -> Self {
        Self {
            status: Status::Ok,
            fingerprint,
            payload,
        }
    }

    /// Create a NOT_FOUND response
    pub fn not_found() -> Self {
        Self::with_message(Status::NotFound, "not found")
    }

    /// Create a CONFLICT response
    pub fn conflict() -> Self {
        Self::with_message(Status::Conflict, "fingerprint mismatch")
    }

    /// Create a BAD_REQUEST response
    pub fn bad_request(message: &str) -> Self {
        Self::with_message(Status::BadRequest, message)
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self::with_message(Status::Error, message)
    }

    fn with_message(status: Status, message: &str) -> Self {
        Self {
            status,
            fingerprint: None,
            payload: Some(Bytes::copy_from_slice(message.as_bytes())),
        }
    }

    /// Render an error as the response the client should see
    pub fn from_error(err: &KvError) -> Self {
        match err {
            KvError::KeyNotFound => Response::not_found(),
            KvError::PreconditionFailed => Response::conflict(),
            KvError::InvalidKey => Response::bad_request("invalid key"),
            KvError::InvalidLength(_)
            | KvError::MalformedLength(_)
            | KvError::PayloadTooLarge { .. } => {
                Response::bad_request("invalid length")
            }
            KvError::InvalidFingerprint(_) | KvError::Protocol(_) => {
                Response::bad_request(&err.to_string())
            }
            _ => Response::error("internal error"),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Payload as UTF-8 text, for error messages
    pub fn message(&self) -> String {
        self.payload
            .as_ref()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default()
    }
}
