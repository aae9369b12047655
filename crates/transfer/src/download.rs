use std::path::{Path, PathBuf};

use lfs_relay_protocol::DownloadRequest;
use reqwest::Method;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::executor::TransferExecutor;
use crate::http::{HttpTransport, TransferResponse, TransportError, build_request};
use crate::progress::{ProgressCounter, ProgressSink};
use crate::storage::{LocalStore, TempWriter};
use crate::TransferError;

impl<T: HttpTransport, S: LocalStore> TransferExecutor<T, S> {
    /// Fetches `req.action.href` into a new temp file and returns its path.
    ///
    /// Progress is reported once per chunk written. On any failure after the
    /// temp file exists, the file is deleted before the error is returned.
    pub async fn download<P: ProgressSink + ?Sized>(
        &self,
        req: &DownloadRequest,
        sink: &mut P,
    ) -> Result<PathBuf, TransferError> {
        let request = build_request(Method::GET, &req.action)?;
        let trace = request.trace();

        let mut response = self
            .transport
            .execute(request)
            .await
            .map_err(|source| TransferError::Transport {
                oid: req.oid.clone(),
                source,
            })?;

        if !response.is_success() {
            if let Err(e) = response.drain().await {
                debug!(oid = %req.oid, error = %e, "failed to drain error body");
            }
            return Err(TransferError::Status {
                request: trace,
                status: response.status,
            });
        }

        if let Some(declared) = response.content_length {
            if declared != req.size {
                debug!(oid = %req.oid, hint = req.size, declared, "server length differs from size hint");
            }
        }

        let (path, mut file) = self
            .store
            .create_temp()
            .await
            .map_err(TransferError::TempFile)?;

        let result = self
            .fill_temp(&req.oid, &mut response, &mut file, &path, sink)
            .await;
        drop(file);

        match result {
            Ok(written) => {
                info!(oid = %req.oid, bytes = written, path = %path.display(), "download complete");
                Ok(path)
            }
            Err(err) => {
                warn!(oid = %req.oid, error = %err, "download failed, removing temp file");
                self.discard(&path).await;
                Err(err)
            }
        }
    }

    /// Copies the response body into `file` and closes it.
    ///
    /// A declared content length caps the copy.
    async fn fill_temp<P: ProgressSink + ?Sized>(
        &self,
        oid: &str,
        response: &mut TransferResponse,
        file: &mut TempWriter,
        path: &Path,
        sink: &mut P,
    ) -> Result<u64, TransferError> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut counter = ProgressCounter::default();
        let mut remaining = response.content_length;

        loop {
            let want = match remaining {
                Some(0) => break,
                Some(left) => left.min(buf.len() as u64) as usize,
                None => buf.len(),
            };

            let n = response
                .body
                .read(&mut buf[..want])
                .await
                .map_err(|e| TransferError::Transport {
                    oid: oid.to_string(),
                    source: TransportError::Io(e),
                })?;
            if n == 0 {
                break;
            }

            file.write_all(&buf[..n])
                .await
                .map_err(|source| TransferError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;

            if let Some(left) = remaining.as_mut() {
                *left -= n as u64;
            }
            let step = counter.advance(n);
            sink.report(oid, step.bytes_so_far, step.bytes_since_last)
                .await;
        }

        // Tokio defers the last write to a background task; flushing is what
        // reports its failure.
        file.flush()
            .await
            .map_err(|source| TransferError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        file.shutdown()
            .await
            .map_err(|source| TransferError::Close {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(counter.total())
    }
}
