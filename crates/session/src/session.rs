use std::ops::ControlFlow;
use std::path::PathBuf;

use lfs_relay_protocol::{InitResponse, Operation, Request, decode_request};
use lfs_relay_transfer::{HttpTransport, LocalStore, TransferError, TransferExecutor};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::writer::ResponseWriter;
use crate::{MAX_LOGGED_LINE, SessionError};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Terminated,
}

/// Counters logged when the session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Lines that decoded to a request.
    pub requests: u64,
    /// Lines that did not.
    pub malformed: u64,
    pub transfers_ok: u64,
    pub transfers_failed: u64,
}

/// Reads request lines, runs them one at a time and writes the responses.
pub struct Session<T, S, W> {
    executor: TransferExecutor<T, S>,
    writer: ResponseWriter<W>,
    state: SessionState,
    operation: Option<Operation>,
    stats: SessionStats,
}

impl<T, S, W> Session<T, S, W>
where
    T: HttpTransport,
    S: LocalStore,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(executor: TransferExecutor<T, S>, output: W) -> Self {
        Self {
            executor,
            writer: ResponseWriter::new(output),
            state: SessionState::Uninitialized,
            operation: None,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Operation named by the last `init`, if any.
    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    pub fn into_output(self) -> W {
        self.writer.into_inner()
    }

    /// Processes lines from `input` until `terminate` or end of input.
    ///
    /// Bad lines are logged and skipped. Only a failure to read `input`
    /// ends the session with an error.
    pub async fn run<R>(&mut self, mut input: R) -> Result<SessionStats, SessionError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = input
                .read_until(b'\n', &mut line)
                .await
                .map_err(SessionError::Input)?;
            if n == 0 {
                debug!("end of input");
                break;
            }
            if self.handle_line(&line).await.is_break() {
                break;
            }
        }

        let stats = self.stats;
        info!(
            requests = stats.requests,
            malformed = stats.malformed,
            transfers_ok = stats.transfers_ok,
            transfers_failed = stats.transfers_failed,
            lines_sent = self.writer.sent(),
            "session finished"
        );
        Ok(stats)
    }

    async fn handle_line(&mut self, raw: &[u8]) -> ControlFlow<()> {
        let Ok(text) = std::str::from_utf8(raw) else {
            self.stats.malformed += 1;
            warn!(bytes = raw.len(), "skipping request line that is not valid UTF-8");
            return ControlFlow::Continue(());
        };

        let text = text.trim();
        if text.is_empty() {
            debug!("skipping blank line");
            return ControlFlow::Continue(());
        }

        match decode_request(text) {
            Ok(request) => {
                self.stats.requests += 1;
                self.handle(request).await
            }
            Err(e) => {
                self.stats.malformed += 1;
                match e.command() {
                    Some(command) if command.is_transfer() => warn!(
                        %command,
                        error = %e,
                        line = %preview(text),
                        "rejecting transfer request, no complete will be sent"
                    ),
                    Some(command) => {
                        warn!(%command, error = %e, line = %preview(text), "skipping invalid request")
                    }
                    None => warn!(error = %e, line = %preview(text), "skipping malformed request"),
                }
                ControlFlow::Continue(())
            }
        }
    }

    /// Runs one decoded request. Returns `Break` once the session is over.
    pub async fn handle(&mut self, request: Request) -> ControlFlow<()> {
        match request {
            Request::Init(init) => {
                let operation = init.operation.map_or("unspecified", Operation::as_str);
                info!(
                    operation,
                    remote = init.remote.as_deref().unwrap_or("-"),
                    concurrent = init.concurrent,
                    concurrent_transfers = init.concurrent_transfers,
                    "Initialised custom adapter for {operation}"
                );
                self.operation = init.operation;
                self.state = SessionState::Ready;
                if let Err(e) = self.writer.send_init(&InitResponse::default()).await {
                    error!(error = %e, "unable to send init response");
                }
            }
            Request::Download(req) => {
                info!(oid = %req.oid, size = req.size, "received download request");
                self.note_early_transfer(&req.oid);
                let outcome = self
                    .executor
                    .download(&req, &mut self.writer)
                    .await
                    .map(Some);
                self.finish(&req.oid, outcome).await;
            }
            Request::Upload(req) => {
                info!(oid = %req.oid, size = req.size, path = %req.path.display(), "received upload request");
                self.note_early_transfer(&req.oid);
                let outcome = self
                    .executor
                    .upload(&req, &mut self.writer)
                    .await
                    .map(|()| None);
                self.finish(&req.oid, outcome).await;
            }
            Request::Terminate => {
                info!("Terminating custom adapter gracefully.");
                self.state = SessionState::Terminated;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn note_early_transfer(&self, oid: &str) {
        if self.state == SessionState::Uninitialized {
            debug!(oid, "transfer requested before init");
        }
    }

    /// Sends the single `complete` line for a transfer.
    async fn finish(&mut self, oid: &str, outcome: Result<Option<PathBuf>, TransferError>) {
        let outcome = match outcome {
            Ok(path) => {
                self.stats.transfers_ok += 1;
                Ok(path)
            }
            Err(e) => {
                self.stats.transfers_failed += 1;
                let code = e.code().as_i32();
                warn!(oid, code, error = %e, "transfer failed");
                Err((code, e.to_string()))
            }
        };
        if let Err(e) = self.writer.send_complete(oid, outcome).await {
            error!(oid, error = %e, "unable to send complete message");
        }
    }
}

fn preview(line: &str) -> &str {
    if line.len() <= MAX_LOGGED_LINE {
        return line;
    }
    let mut end = MAX_LOGGED_LINE;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
