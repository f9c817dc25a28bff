use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc::error::SendError;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, trace, warn};

use super::stats::StageStats;
use crate::context::Context;
use crate::transform::{StageError, Transformer};

/// Type alias for a boxed input stream
type InputStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// Input shared by competing workers; each pull hands an item to exactly one of them
pub(crate) type SharedInput<T> = Arc<Mutex<InputStream<T>>>;

pub(crate) fn share_input<T, S>(input: S) -> SharedInput<T>
where
    S: Stream<Item = T> + Send + 'static,
{
    Arc::new(Mutex::new(Box::pin(input)))
}

/// Where a worker delivers its results
pub(crate) enum Handoff<T, O> {
    /// Straight into the stage's output stream
    Direct(mpsc::Sender<O>),

    /// To the fan-in task, together with the item the result was computed from
    Merge(mpsc::Sender<(T, O)>),
}

impl<T, O> Handoff<T, O> {
    fn is_closed(&self) -> bool {
        match self {
            Self::Direct(tx) => tx.is_closed(),
            Self::Merge(tx) => tx.is_closed(),
        }
    }
}

/// One sequential worker: fetch, check the context, transform or cancel, repeat
///
/// The worker owns its output sender; dropping it when the input is exhausted
/// is what closes the worker's output. Items whose result cannot be handed on
/// go back to `cancel`, so every fetched item is resolved exactly once.
pub(crate) struct Worker<T, P>
where
    T: Send + Sync + 'static,
    P: Transformer<T>,
{
    pub(crate) id: usize,
    pub(crate) stage: Arc<str>,
    pub(crate) ctx: Context,
    pub(crate) transformer: Arc<P>,
    pub(crate) input: SharedInput<T>,
    pub(crate) output: Handoff<T, P::Output>,
    pub(crate) stats: Arc<StageStats>,
}

impl<T, P> Worker<T, P>
where
    T: Send + Sync + 'static,
    P: Transformer<T> + 'static,
{
    /// Run until the input stream is closed and drained
    ///
    /// Context expiry never stops the loop, it only changes how each fetched
    /// item is resolved.
    pub(crate) async fn run(self) {
        debug!(stage = %self.stage, worker = self.id, "Worker started");

        while let Some(item) = self.fetch().await {
            self.stats.record_fetched();
            self.resolve(item).await;
        }

        debug!(
            stage = %self.stage,
            worker = self.id,
            "Input exhausted, closing worker output"
        );
    }

    async fn fetch(&self) -> Option<T> {
        let mut input = self.input.lock().await;
        input.next().await
    }

    async fn resolve(&self, item: T) {
        let outcome = match self.precheck() {
            Some(error) => Err(error),
            None => self
                .transformer
                .transform(&self.ctx, &item)
                .await
                .map_err(StageError::Transform),
        };

        let (item, error) = match outcome {
            Ok(result) => match self.deliver(item, result).await {
                Ok(()) => return,
                Err(item) => {
                    warn!(
                        stage = %self.stage,
                        worker = self.id,
                        "Output dropped by consumer, canceling remaining items"
                    );
                    (item, StageError::OutputClosed)
                }
            },
            Err(error) => (item, error),
        };

        trace!(stage = %self.stage, worker = self.id, %error, "Canceling item");
        self.transformer.cancel(item, error).await;
        self.stats.record_canceled();
    }

    /// Hand `result` on, giving `item` back if nobody will receive it
    async fn deliver(&self, item: T, result: P::Output) -> Result<(), T> {
        match &self.output {
            Handoff::Direct(tx) => {
                tx.send(result).await.map_err(|_| item)?;
                self.stats.record_emitted();
            }
            // The merge task counts the item once the consumer has it
            Handoff::Merge(tx) => {
                tx.send((item, result))
                    .await
                    .map_err(|SendError((item, _))| item)?;
            }
        }
        Ok(())
    }

    /// Liveness is checked per item, never cached
    fn precheck(&self) -> Option<StageError<P::Error>> {
        if let Some(reason) = self.ctx.err() {
            return Some(StageError::Context(reason));
        }

        if self.output.is_closed() {
            return Some(StageError::OutputClosed);
        }

        None
    }
}
