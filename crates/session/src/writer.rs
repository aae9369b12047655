//! Response side of the session: one flushed JSON line per message.

use std::path::PathBuf;

use lfs_relay_protocol::{InitResponse, Response, encode_line};
use lfs_relay_transfer::{ProgressSink, SinkFuture};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Error returned when a response could not be written.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("cannot encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("cannot write response: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes protocol messages to the controller.
///
/// Every message is flushed as soon as it is written; nothing is held back
/// between commands.
pub struct ResponseWriter<W> {
    out: W,
    sent: u64,
}

impl<W: AsyncWrite + Unpin + Send> ResponseWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, sent: 0 }
    }

    /// Encodes `msg` as one line, writes it and flushes.
    pub async fn send<T: Serialize>(&mut self, msg: &T) -> Result<(), SendError> {
        let line = encode_line(msg)?;
        self.out.write_all(&line).await?;
        self.out.flush().await?;
        self.sent += 1;
        Ok(())
    }

    pub async fn send_init(&mut self, response: &InitResponse) -> Result<(), SendError> {
        self.send(response).await
    }

    pub async fn send_progress(
        &mut self,
        oid: &str,
        bytes_so_far: u64,
        bytes_since_last: u64,
    ) -> Result<(), SendError> {
        self.send(&Response::progress(oid, bytes_so_far, bytes_since_last))
            .await
    }

    /// Sends the terminal message for a transfer.
    pub async fn send_complete(
        &mut self,
        oid: &str,
        outcome: Result<Option<PathBuf>, (i32, String)>,
    ) -> Result<(), SendError> {
        let response = match outcome {
            Ok(path) => Response::completed(oid, path),
            Err((code, message)) => Response::failed(oid, code, message),
        };
        self.send(&response).await
    }

    /// Number of lines written so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Progress lines go straight to the controller, one per chunk.
impl<W: AsyncWrite + Unpin + Send> ProgressSink for ResponseWriter<W> {
    fn report<'a>(
        &'a mut self,
        oid: &'a str,
        bytes_so_far: u64,
        bytes_since_last: u64,
    ) -> SinkFuture<'a> {
        Box::pin(async move {
            if let Err(e) = self
                .send_progress(oid, bytes_so_far, bytes_since_last)
                .await
            {
                tracing::warn!(oid, error = %e, "unable to send progress update");
            }
        })
    }
}
