use std::path::Path;

use tracing::warn;

use crate::DEFAULT_CHUNK_SIZE;
use crate::http::HttpTransport;
use crate::storage::LocalStore;

/// Runs downloads and uploads one at a time.
///
/// See `download.rs` and `upload.rs` for the two operations.
pub struct TransferExecutor<T, S> {
    pub(crate) transport: T,
    pub(crate) store: S,
    pub(crate) chunk_size: usize,
}

impl<T: HttpTransport, S: LocalStore> TransferExecutor<T, S> {
    pub fn new(transport: T, store: S) -> Self {
        Self {
            transport,
            store,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the I/O chunk size. `0` restores the default.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        self
    }

    /// Deletes a temp file after a failed download. Failure is only logged.
    pub(crate) async fn discard(&self, path: &Path) {
        if let Err(e) = self.store.remove(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove temp file");
        }
    }
}
