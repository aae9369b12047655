use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the field carrying the message kind on every tagged line.
pub const ID_FIELD: &str = "id";

/// Command kind identifier carried in the `id` field of a request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    #[serde(rename = "init")]
    Init,
    #[serde(rename = "download")]
    Download,
    #[serde(rename = "upload")]
    Upload,
    #[serde(rename = "terminate")]
    Terminate,
}

impl CommandKind {
    /// Looks up a command kind by its wire name.
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            "init" => Some(Self::Init),
            "download" => Some(Self::Download),
            "upload" => Some(Self::Upload),
            "terminate" => Some(Self::Terminate),
            _ => None,
        }
    }

    /// Returns the wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Download => "download",
            Self::Upload => "upload",
            Self::Terminate => "terminate",
        }
    }

    /// Whether this command moves bytes and must be answered with `complete`.
    pub fn is_transfer(self) -> bool {
        matches!(self, Self::Download | Self::Upload)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
