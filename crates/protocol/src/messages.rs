use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Shared payloads
// ---------------------------------------------------------------------------

/// Direction of the transfers a session will carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Upload,
    Download,
}

impl Operation {
    /// Looks up an operation by its wire name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "upload" => Some(Self::Upload),
            "download" => Some(Self::Download),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any value that is not a known operation name reads as `None`.
fn lenient_operation<'de, D>(deserializer: D) -> Result<Option<Operation>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(Operation::parse))
}

/// Remote endpoint for one transfer.
///
/// Headers are applied verbatim to the outgoing request. `expires_at` is
/// informational only; the controller checks expiry before issuing a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub href: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub header: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Action {
    /// Creates an action with no headers and no expiry.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            header: BTreeMap::new(),
            expires_at: None,
        }
    }

    /// Adds a header, replacing any previous value for the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(name.into(), value.into());
        self
    }
}

/// Error details carried by `init` and `complete` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    pub code: i32,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Opens a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitRequest {
    /// `None` when the controller sent no operation or one this adapter
    /// does not know. Init still succeeds.
    #[serde(
        default,
        deserialize_with = "lenient_operation",
        skip_serializing_if = "Option::is_none"
    )]
    pub operation: Option<Operation>,
    /// Remote name the controller is talking to, when it says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub concurrent: bool,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        rename = "concurrenttransfers"
    )]
    pub concurrent_transfers: u32,
}

/// Fetches one object into a local temp file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub oid: String,
    /// Expected length. A length declared by the server takes precedence.
    pub size: u64,
    pub action: Action,
}

/// Sends one local file to the remote endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub oid: String,
    pub size: u64,
    pub path: PathBuf,
    pub action: Action,
}

/// One decoded request line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "lowercase")]
pub enum Request {
    Init(InitRequest),
    Download(DownloadRequest),
    Upload(UploadRequest),
    Terminate,
}

impl Request {
    /// Object id for transfer requests.
    pub fn oid(&self) -> Option<&str> {
        match self {
            Self::Download(req) => Some(&req.oid),
            Self::Upload(req) => Some(&req.oid),
            Self::Init(_) | Self::Terminate => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Answer to `init`. Carries no `id` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

/// Progress and terminal messages for a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "lowercase")]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    Progress {
        oid: String,
        bytes_so_far: u64,
        bytes_since_last: u64,
    },
    Complete {
        oid: String,
        /// Set only for a successful download.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<WireError>,
    },
}

impl Response {
    pub fn progress(oid: impl Into<String>, bytes_so_far: u64, bytes_since_last: u64) -> Self {
        Self::Progress {
            oid: oid.into(),
            bytes_so_far,
            bytes_since_last,
        }
    }

    /// Terminal success. `path` is `None` for uploads.
    pub fn completed(oid: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Complete {
            oid: oid.into(),
            path,
            error: None,
        }
    }

    /// Terminal failure.
    pub fn failed(oid: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self::Complete {
            oid: oid.into(),
            path: None,
            error: Some(WireError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn oid(&self) -> &str {
        match self {
            Self::Progress { oid, .. } | Self::Complete { oid, .. } => oid,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}
