//! Protocol Module
//!
//! Defines the textual wire protocol for client-server communication.
//!
//! ## Request Format
//! ```text
//! <VERB> [<key>] [<len>] [<if-match>]\n
//! <payload: exactly len bytes, writes only>
//! ```
//!
//! ### Verbs
//! - GET    <key>                 - value and its fingerprint
//! - HEAD   <key>                 - fingerprint only
//! - PUT    <key> <len> [<fp>]    - upsert; conditional when <fp> is given
//!   (POST and PATCH are accepted as aliases)
//! - DELETE <key>                 - remove (alias: DEL)
//! - PING                         - liveness check
//!
//! ## Response Format
//! ```text
//! <STATUS> <fingerprint|-> <len>\n
//! <payload: exactly len bytes>
//! ```
//!
//! ### Status Codes
//! - OK          - success
//! - NOT_FOUND   - key is absent
//! - CONFLICT    - conditional write rejected
//! - BAD_REQUEST - malformed request, invalid key or length
//! - ERROR       - internal failure

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, MAX_LINE_LEN, MAX_PAYLOAD_SIZE,
};
