use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures::stream::{self, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::stats::StageStats;
use crate::transform::{StageError, Transformer};

/// One worker's handoff channel as seen by the merge
struct WorkerOutput<T>(mpsc::Receiver<T>);

impl<T> Stream for WorkerOutput<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<T>> {
        self.0.poll_recv(cx)
    }
}

/// Fan-in coordinator forwarding every worker result into one sink
///
/// `select_all` yields until all sources have closed, and the task holds the
/// only sender for `sink`, so the external stream closes exactly when the
/// last worker closes. It only moves finished items and never computes.
///
/// An item counts as emitted once its result is in `sink`. If the consumer
/// refuses the output, the held item and everything still queued behind it
/// go to `cancel` instead.
pub(crate) fn spawn_merge<T, P>(
    stage: Arc<str>,
    transformer: Arc<P>,
    sources: Vec<mpsc::Receiver<(T, P::Output)>>,
    sink: mpsc::Sender<P::Output>,
    stats: Arc<StageStats>,
) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
    P: Transformer<T> + 'static,
{
    let workers = sources.len();
    let mut merged = stream::select_all(sources.into_iter().map(WorkerOutput));

    tokio::spawn(async move {
        while let Some((item, result)) = merged.next().await {
            if sink.send(result).await.is_ok() {
                stats.record_emitted();
                continue;
            }

            warn!(stage = %stage, "Output dropped by consumer, canceling undelivered items");
            transformer.cancel(item, StageError::OutputClosed).await;
            stats.record_canceled();

            // Closing makes pending and future worker sends fail, which sends
            // those items to cancel on the worker side.
            let mut stranded = 0usize;
            for WorkerOutput(mut rx) in merged {
                rx.close();
                while let Some((item, _)) = rx.recv().await {
                    transformer.cancel(item, StageError::OutputClosed).await;
                    stats.record_canceled();
                    stranded += 1;
                }
            }

            debug!(stage = %stage, stranded, "Canceled items queued behind the closed output");
            return;
        }

        debug!(stage = %stage, workers, "All workers closed, closing output");
    })
}
