//! Local filesystem seam: download temp files and upload sources.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// A boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Writer for a freshly created temp file.
pub type TempWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Reader over an upload source file.
pub type SourceReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// File operations the executor needs.
pub trait LocalStore: Send + Sync {
    /// Creates a new uniquely named file and returns its absolute path.
    fn create_temp(&self) -> StoreFuture<'_, io::Result<(PathBuf, TempWriter)>>;

    /// Opens an existing file read-only.
    fn open_read<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, io::Result<SourceReader>>;

    /// Deletes a file.
    fn remove<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, io::Result<()>>;
}

/// [`LocalStore`] creating temp files in one directory.
#[derive(Debug, Clone)]
pub struct TempDirStore {
    dir: PathBuf,
    prefix: String,
}

impl TempDirStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }
}

impl LocalStore for TempDirStore {
    fn create_temp(&self) -> StoreFuture<'_, io::Result<(PathBuf, TempWriter)>> {
        Box::pin(async move {
            let named = tempfile::Builder::new()
                .prefix(&self.prefix)
                .tempfile_in(&self.dir)?;
            // The caller owns the file from here; it must outlive this handle.
            let (file, path) = named.keep().map_err(|e| e.error)?;
            let path = std::path::absolute(path)?;
            debug!(path = %path.display(), "temp file created");

            let writer: TempWriter = Box::new(tokio::fs::File::from_std(file));
            Ok((path, writer))
        })
    }

    fn open_read<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, io::Result<SourceReader>> {
        Box::pin(async move {
            let file = tokio::fs::File::open(path).await?;
            let reader: SourceReader = Box::new(file);
            Ok(reader)
        })
    }

    fn remove<'a>(&'a self, path: &'a Path) -> StoreFuture<'a, io::Result<()>> {
        Box::pin(async move { tokio::fs::remove_file(path).await })
    }
}
