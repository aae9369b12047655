//! Session dispatcher for the custom transfer adapter.
//!
//! Reads one request line at a time, routes it, and writes every response
//! as a flushed JSON line. Transfers run to completion before the next line
//! is read, so a single [`Session`] never has more than one transfer in
//! flight.

mod session;
mod writer;

pub use session::{Session, SessionState, SessionStats};
pub use writer::{ResponseWriter, SendError};

/// Longest prefix of a rejected line copied into diagnostics.
pub const MAX_LOGGED_LINE: usize = 256;

/// Errors that end a session early.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("reading requests failed: {0}")]
    Input(#[source] std::io::Error),
}
