use std::sync::Arc;

use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::merge::spawn_merge;
use super::stats::StageStats;
use super::stream::StageStream;
use super::worker::{Handoff, Worker, share_input};
use crate::context::Context;
use crate::transform::Transformer;

const DEFAULT_STAGE_NAME: &str = "stage";

/// How many workers a stage runs and whether they go through the fan-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fanout {
    /// One worker writing straight to the output stream - DEFAULT
    Single,

    /// N competing workers whose outputs are merged into the output stream
    Pool(usize),
}

/// Builder for a processing stage
///
/// Spawns tokio tasks when run, so [`Stage::run`] must be called from within
/// a tokio runtime.
///
/// # Example
/// ```rust,ignore
/// let ctx = Context::with_timeout(Duration::from_secs(30));
///
/// let out = Stage::new(Arc::new(Thumbnailer::default()))
///     .named("thumbnails")
///     .with_workers(8)
///     .with_output_capacity(32)
///     .run(ctx, uploads);
/// ```
pub struct Stage<P> {
    transformer: Arc<P>,
    name: Arc<str>,
    fanout: Fanout,
    output_capacity: usize,
}

impl<P> Stage<P> {
    /// Create a single-worker stage around `transformer`
    pub fn new(transformer: P) -> Self {
        Self {
            transformer: Arc::new(transformer),
            name: Arc::from(DEFAULT_STAGE_NAME),
            fanout: Fanout::Single,
            output_capacity: 1,
        }
    }

    /// Run `workers` competing workers behind a fan-in merge
    ///
    /// A count of zero is clamped to one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        if workers == 0 {
            warn!(stage = %self.name, "Worker count of 0 requested, using 1");
        }
        self.fanout = Fanout::Pool(workers.max(1));
        self
    }

    /// Buffer up to `capacity` results ahead of the consumer (defaults to 1)
    pub fn with_output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity.max(1);
        self
    }

    /// Name used in log events
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Worker layout this stage will run with
    pub fn fanout(&self) -> Fanout {
        self.fanout
    }

    /// Start consuming `input` and return the stage's output stream
    ///
    /// The output closes only after `input` has closed and every fetched item
    /// has been emitted or canceled. Context expiry alone never closes it.
    pub fn run<T, S>(self, ctx: Context, input: S) -> StageStream<<P as Transformer<T>>::Output>
    where
        T: Send + Sync + 'static,
        P: Transformer<T> + 'static,
        S: Stream<Item = T> + Send + 'static,
    {
        let Stage {
            transformer,
            name,
            fanout,
            output_capacity,
        } = self;

        let input = share_input(input);
        let stats = Arc::new(StageStats::new());
        let (output, rx) = mpsc::channel(output_capacity);

        match fanout {
            Fanout::Single => {
                debug!(stage = %name, "Starting sequential stage");
                let worker = Worker {
                    id: 0,
                    stage: name,
                    ctx,
                    transformer,
                    input,
                    output: Handoff::Direct(output),
                    stats: Arc::clone(&stats),
                };
                tokio::spawn(worker.run());
            }
            Fanout::Pool(workers) => {
                debug!(stage = %name, workers, "Starting concurrent stage");
                let sources: Vec<_> = (0..workers)
                    .map(|id| {
                        let (worker_output, worker_rx) = mpsc::channel(1);
                        let worker = Worker {
                            id,
                            stage: Arc::clone(&name),
                            ctx: ctx.clone(),
                            transformer: Arc::clone(&transformer),
                            input: Arc::clone(&input),
                            output: Handoff::Merge(worker_output),
                            stats: Arc::clone(&stats),
                        };
                        tokio::spawn(worker.run());
                        worker_rx
                    })
                    .collect();

                spawn_merge(name, transformer, sources, output, Arc::clone(&stats));
            }
        }

        StageStream::new(rx, stats)
    }
}

/// Apply `transformer` to every item of `input` with a single worker
///
/// Results keep input order. Once `ctx` expires, every item still arriving
/// is handed to the transformer's cancel callback; the output closes when
/// `input` does.
pub fn process<T, P, S>(ctx: Context, transformer: P, input: S) -> StageStream<P::Output>
where
    T: Send + Sync + 'static,
    P: Transformer<T> + 'static,
    S: Stream<Item = T> + Send + 'static,
{
    Stage::new(transformer).run(ctx, input)
}

/// Apply `transformer` with `concurrency` competing workers and merge their results
///
/// Each input item goes to exactly one worker. No ordering is guaranteed
/// across workers. The output closes once all workers have seen the input
/// close. A `concurrency` of zero is treated as one.
pub fn process_concurrently<T, P, S>(
    ctx: Context,
    concurrency: usize,
    transformer: P,
    input: S,
) -> StageStream<P::Output>
where
    T: Send + Sync + 'static,
    P: Transformer<T> + 'static,
    S: Stream<Item = T> + Send + 'static,
{
    Stage::new(transformer)
        .with_workers(concurrency)
        .run(ctx, input)
}
