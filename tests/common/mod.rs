#![allow(dead_code)]

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use stagecraft::prelude::*;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, sleep_until};

/// Upper bound on how long a scenario watches the output stream
pub const MAX_TEST_DURATION: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum MockError {
    #[error("process error: {0}")]
    Process(u32),

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Transformer that sleeps, optionally fails, and records every cancellation
#[derive(Default)]
pub struct MockTransformer {
    pub process_duration: Duration,
    pub process_returns_errors: bool,
    pub cancel_duration: Duration,
    /// When set, `transform` runs to completion even after the context expires
    pub ignores_context: bool,
    canceled: Mutex<Vec<(u32, String)>>,
}

impl MockTransformer {
    pub fn new(process_duration: Duration) -> Self {
        Self {
            process_duration,
            ..Self::default()
        }
    }

    pub fn failing(mut self) -> Self {
        self.process_returns_errors = true;
        self
    }

    pub fn with_cancel_duration(mut self, duration: Duration) -> Self {
        self.cancel_duration = duration;
        self
    }

    pub fn ignoring_context(mut self) -> Self {
        self.ignores_context = true;
        self
    }

    pub fn canceled(&self) -> Vec<u32> {
        self.canceled.lock().unwrap().iter().map(|(i, _)| *i).collect()
    }

    pub fn canceled_errs(&self) -> Vec<String> {
        self.canceled
            .lock()
            .unwrap()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait]
impl Transformer<u32> for MockTransformer {
    type Output = u32;
    type Error = MockError;

    async fn transform(&self, ctx: &Context, item: &u32) -> Result<u32, MockError> {
        if self.ignores_context {
            sleep(self.process_duration).await;
        } else {
            tokio::select! {
                biased;
                _ = ctx.done() => {
                    return Err(ctx.err().unwrap_or(ContextError::DeadlineExceeded).into());
                }
                _ = sleep(self.process_duration) => {}
            }
        }

        if self.process_returns_errors {
            return Err(MockError::Process(*item));
        }
        Ok(*item)
    }

    async fn cancel(&self, item: u32, error: StageError<MockError>) {
        if !self.cancel_duration.is_zero() {
            sleep(self.cancel_duration).await;
        }
        self.canceled.lock().unwrap().push((item, error.to_string()));
    }
}

/// Input stream fed by a producer task that closes it after the last item
pub fn closing_input(items: Vec<u32>) -> StageStream<u32> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        for item in items {
            if tx.send(item).await.is_err() {
                break;
            }
        }
    });
    StageStream::from(rx)
}

/// Read `out` until it closes or `max` elapses; returns the items and whether it is still open
pub async fn collect_for(out: &mut StageStream<u32>, max: Duration) -> (Vec<u32>, bool) {
    let deadline = Instant::now() + max;
    let mut outs = Vec::new();

    loop {
        tokio::select! {
            item = out.recv() => match item {
                Some(item) => outs.push(item),
                None => return (outs, false),
            },
            _ = sleep_until(deadline) => return (outs, true),
        }
    }
}

/// Multiset equality, ignoring order
pub fn same_elements<T: Eq + Hash + Clone>(want: &[T], got: &[T]) -> bool {
    fn counts<T: Eq + Hash + Clone>(items: &[T]) -> HashMap<T, usize> {
        let mut counts = HashMap::new();
        for item in items {
            *counts.entry(item.clone()).or_insert(0) += 1;
        }
        counts
    }
    counts(want) == counts(got)
}
