//! Line framing for the adapter protocol.
//!
//! Every message is one JSON object on one line. Decoding reads the `id`
//! tag first and only then validates the fields of that command, so a caller
//! can tell garbage apart from a known command with a bad shape.

use serde::Serialize;

use crate::constants::{CommandKind, ID_FIELD};
use crate::messages::Request;

/// Why a request line was rejected.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("request is not a JSON object")]
    NotAnObject,

    #[error("request has no string `id` field")]
    MissingCommand,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid {command} request: {source}")]
    InvalidFields {
        command: CommandKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} request has an empty oid")]
    EmptyOid(CommandKind),
}

impl DecodeError {
    /// Command the line claimed to be, when the tag itself was readable.
    pub fn command(&self) -> Option<CommandKind> {
        match self {
            Self::InvalidFields { command, .. } => Some(*command),
            Self::EmptyOid(command) => Some(*command),
            _ => None,
        }
    }
}

/// Decodes one request line. Trailing `\r`/`\n` are ignored.
pub fn decode_request(line: &str) -> Result<Request, DecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let value: serde_json::Value = serde_json::from_str(line).map_err(DecodeError::Syntax)?;

    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let id = object
        .get(ID_FIELD)
        .and_then(serde_json::Value::as_str)
        .ok_or(DecodeError::MissingCommand)?;
    let command =
        CommandKind::parse(id).ok_or_else(|| DecodeError::UnknownCommand(id.to_string()))?;

    let request: Request = serde_json::from_value(value)
        .map_err(|source| DecodeError::InvalidFields { command, source })?;

    if request.oid().is_some_and(str::is_empty) {
        return Err(DecodeError::EmptyOid(command));
    }
    Ok(request)
}

/// Encodes a message as one newline-terminated line.
pub fn encode_line<T: Serialize>(msg: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = serde_json::to_vec(msg)?;
    buf.push(b'\n');
    Ok(buf)
}
