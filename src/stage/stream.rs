use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use super::stats::StageStats;

/// Closable FIFO stream of items produced by a stage
///
/// Yields `None` exactly once every writer has finished, which is the only
/// "no more output" signal. Also usable as a stage input: any tokio
/// `mpsc::Receiver` converts into one, and dropping every sender closes it.
///
/// # Example
/// ```rust,ignore
/// let (tx, rx) = mpsc::channel(16);
/// let mut out = process(ctx, transformer, StageStream::from(rx));
///
/// tx.send(item).await?;
/// drop(tx); // closes the input, so `out` closes once drained
///
/// while let Some(result) = out.recv().await {
///     handle(result);
/// }
/// ```
#[derive(Debug)]
pub struct StageStream<T> {
    rx: mpsc::Receiver<T>,
    stats: Arc<StageStats>,
}

impl<T> StageStream<T> {
    pub(crate) fn new(rx: mpsc::Receiver<T>, stats: Arc<StageStats>) -> Self {
        Self { rx, stats }
    }

    /// Receive the next item, or `None` once the stream has closed
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Stop accepting new items while still yielding anything already buffered
    ///
    /// The stream ends as soon as the buffer is drained. Workers keep draining
    /// the input in the background, routing every later item to the
    /// transformer's cancel callback. Dropping the stream has the same effect,
    /// except that results still buffered in it are discarded even though
    /// they already count as emitted.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Accounting for the stage feeding this stream
    pub fn stats(&self) -> Arc<StageStats> {
        Arc::clone(&self.stats)
    }
}

impl<T> From<mpsc::Receiver<T>> for StageStream<T> {
    fn from(rx: mpsc::Receiver<T>) -> Self {
        Self::new(rx, Arc::new(StageStats::new()))
    }
}

impl<T> Stream for StageStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
