use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;

/// A boxed future returned by [`ProgressSink::report`].
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Receives byte counts while a transfer is running.
///
/// `bytes_so_far` is cumulative for the oid; `bytes_since_last` is the size
/// of the chunk that was just moved.
pub trait ProgressSink: Send {
    fn report<'a>(
        &'a mut self,
        oid: &'a str,
        bytes_so_far: u64,
        bytes_since_last: u64,
    ) -> SinkFuture<'a>;
}

/// One progress increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStep {
    pub bytes_so_far: u64,
    pub bytes_since_last: u64,
}

/// Running byte total for one transfer.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    so_far: u64,
}

impl ProgressCounter {
    /// Adds a chunk of `n` bytes and returns the resulting step.
    pub fn advance(&mut self, n: usize) -> ProgressStep {
        let n = n as u64;
        self.so_far += n;
        ProgressStep {
            bytes_so_far: self.so_far,
            bytes_since_last: n,
        }
    }

    pub fn total(&self) -> u64 {
        self.so_far
    }
}

/// Reader that publishes a [`ProgressStep`] for every non-empty read.
///
/// Used for upload bodies, which are pulled by the transport rather than
/// by the executor.
pub struct ProgressReader<R> {
    inner: R,
    counter: ProgressCounter,
    steps: mpsc::UnboundedSender<ProgressStep>,
}

impl<R> ProgressReader<R> {
    pub fn new(inner: R, steps: mpsc::UnboundedSender<ProgressStep>) -> Self {
        Self {
            inner,
            counter: ProgressCounter::default(),
            steps,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;

        let n = buf.filled().len() - before;
        if n > 0 {
            // Receiver gone means nobody is listening any more.
            let _ = this.steps.send(this.counter.advance(n));
        }
        Poll::Ready(Ok(()))
    }
}
