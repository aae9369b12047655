//! Transfer execution for the custom adapter.
//!
//! A [`TransferExecutor`] runs one download or upload to completion against
//! an [`HttpTransport`] and a [`LocalStore`], reporting byte counts to a
//! [`ProgressSink`] as chunks move.

mod download;
mod executor;
mod http;
mod progress;
mod storage;
mod upload;

use std::io;
use std::path::PathBuf;

pub use executor::TransferExecutor;
pub use http::{
    HttpTransport, RequestBody, RequestReader, ReqwestTransport, ResponseBody, TransferRequest,
    TransferResponse, TransportError, TransportFuture, build_request,
};
pub use progress::{ProgressCounter, ProgressReader, ProgressSink, ProgressStep, SinkFuture};
pub use storage::{LocalStore, SourceReader, StoreFuture, TempDirStore, TempWriter};

/// Default I/O chunk size: 32 KiB.
///
/// Progress is reported once per chunk, so this also bounds how often
/// `progress` lines are written.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Prefix for download temp file names.
pub const DEFAULT_TEMP_PREFIX: &str = "lfscustomdl";

/// Media type sent on uploads when the action does not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Numeric error class reported in a `complete` message.
///
/// | Class | Code |
/// |---|---|
/// | request construction | 2 |
/// | local file create/open | 3 |
/// | temp file write | 4 |
/// | temp file close | 5 |
/// | transport | 6 |
/// | remote status | the HTTP status (>= 300) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    RequestConstruction,
    LocalFile,
    Write,
    Close,
    Transport,
    Status(u16),
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::RequestConstruction => 2,
            Self::LocalFile => 3,
            Self::Write => 4,
            Self::Close => 5,
            Self::Transport => 6,
            Self::Status(status) => i32::from(status),
        }
    }
}

/// Errors produced by a single transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid request to {href:?}: {reason}")]
    InvalidRequest { href: String, reason: String },

    #[error("error transferring data for {oid}: {source}")]
    Transport {
        oid: String,
        #[source]
        source: TransportError,
    },

    #[error("invalid status for {request}: {status}")]
    Status { request: String, status: u16 },

    #[error("cannot create tempfile: {0}")]
    TempFile(#[source] io::Error),

    #[error("cannot read data from {path:?}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write data to tempfile {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't close tempfile {path:?}: {source}")]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest { .. } => ErrorCode::RequestConstruction,
            Self::Transport { .. } => ErrorCode::Transport,
            Self::Status { status, .. } => ErrorCode::Status(*status),
            Self::TempFile(_) | Self::Source { .. } => ErrorCode::LocalFile,
            Self::Write { .. } => ErrorCode::Write,
            Self::Close { .. } => ErrorCode::Close,
        }
    }
}
