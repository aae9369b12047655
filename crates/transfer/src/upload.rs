use lfs_relay_protocol::UploadRequest;
use reqwest::Method;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::executor::TransferExecutor;
use crate::http::{HttpTransport, RequestBody, build_request};
use crate::progress::{ProgressReader, ProgressSink};
use crate::storage::LocalStore;
use crate::{DEFAULT_CONTENT_TYPE, TransferError};

impl<T: HttpTransport, S: LocalStore> TransferExecutor<T, S> {
    /// Sends the file at `req.path` to `req.action.href` with a PUT.
    ///
    /// Unless the action asks for chunked encoding, the request declares a
    /// content length of `req.size`. The response body is always drained.
    pub async fn upload<P: ProgressSink + ?Sized>(
        &self,
        req: &UploadRequest,
        sink: &mut P,
    ) -> Result<(), TransferError> {
        let mut request = build_request(Method::PUT, &req.action)?;

        if !request.headers.contains_key(CONTENT_TYPE) {
            request
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        }

        let length = if request.is_chunked() {
            request.headers.remove(CONTENT_LENGTH);
            None
        } else {
            request
                .headers
                .insert(CONTENT_LENGTH, HeaderValue::from(req.size));
            Some(req.size)
        };

        let source = self
            .store
            .open_read(&req.path)
            .await
            .map_err(|source| TransferError::Source {
                path: req.path.clone(),
                source,
            })?;

        let (steps_tx, mut steps) = mpsc::unbounded_channel();
        request.body = RequestBody::Stream {
            reader: Box::new(ProgressReader::new(source, steps_tx)),
            length,
        };
        let trace = request.trace();
        debug!(oid = %req.oid, request = %trace, "sending upload");

        // The transport pulls the body; relay its progress while it runs.
        let mut exchange = self.transport.execute(request);
        let mut sent = 0;
        let outcome = loop {
            tokio::select! {
                biased;
                Some(step) = steps.recv() => {
                    sent = step.bytes_so_far;
                    sink.report(&req.oid, step.bytes_so_far, step.bytes_since_last).await;
                }
                outcome = &mut exchange => break outcome,
            }
        };
        drop(exchange);
        while let Ok(step) = steps.try_recv() {
            sent = step.bytes_so_far;
            sink.report(&req.oid, step.bytes_so_far, step.bytes_since_last)
                .await;
        }

        let mut response = outcome.map_err(|source| TransferError::Transport {
            oid: req.oid.clone(),
            source,
        })?;

        if let Err(e) = response.drain().await {
            debug!(oid = %req.oid, error = %e, "failed to drain response body");
        }

        if !response.is_success() {
            return Err(TransferError::Status {
                request: trace,
                status: response.status,
            });
        }

        if length.is_some_and(|declared| declared != sent) {
            warn!(oid = %req.oid, declared = req.size, sent, "upload size differs from declared length");
        }
        info!(oid = %req.oid, bytes = sent, status = response.status, "upload complete");
        Ok(())
    }
}
