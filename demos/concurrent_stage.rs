//! Example: Concurrent Stage
//!
//! Resolves a batch of fake hostnames with a pool of workers. Each lookup
//! takes a random-ish amount of time and some fail; failures and anything
//! still arriving after the deadline go to the transformer's cancel
//! callback instead of the output.
//!
//! Usage:
//!   cargo run --example concurrent_stage -- [workers] [timeout_ms]

use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use stagecraft::prelude::*;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
enum LookupError {
    #[error("no such host: {0}")]
    NoSuchHost(String),

    #[error(transparent)]
    Context(#[from] ContextError),
}

#[derive(Default)]
struct Resolver {
    failed: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Transformer<String> for Resolver {
    type Output = (String, [u8; 4]);
    type Error = LookupError;

    async fn transform(&self, ctx: &Context, host: &String) -> Result<Self::Output, LookupError> {
        let latency = Duration::from_millis(20 + (host.len() as u64 * 17) % 90);

        tokio::select! {
            biased;
            _ = ctx.done() => {
                return Err(ctx.err().unwrap_or(ContextError::Canceled).into());
            }
            _ = tokio::time::sleep(latency) => {}
        }

        if host.contains("invalid") {
            return Err(LookupError::NoSuchHost(host.clone()));
        }

        let seed = host.bytes().fold(7u8, |acc, b| acc.wrapping_mul(31).wrapping_add(b));
        Ok((host.clone(), [10, seed, seed.wrapping_add(1), 1]))
    }

    async fn cancel(&self, host: String, error: StageError<LookupError>) {
        if let Ok(mut failed) = self.failed.lock() {
            failed.push((host, error.to_string()));
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let workers: usize = args.get(1).map(|s| s.parse::<usize>()).transpose()?.unwrap_or(4);
    let timeout_ms: u64 = args.get(2).map(|s| s.parse::<u64>()).transpose()?.unwrap_or(250);

    eprintln!("=== Concurrent Stage Example ===");
    eprintln!("Workers: {}, deadline: {}ms", workers, timeout_ms);
    eprintln!();

    let ctx = Context::with_timeout(Duration::from_millis(timeout_ms));
    let resolver = Arc::new(Resolver::default());

    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
        for i in 0..40 {
            let host = if i % 7 == 0 {
                format!("invalid-{i}.example")
            } else {
                format!("svc-{i}.internal.example")
            };
            if tx.send(host).await.is_err() {
                break;
            }
        }
    });

    let mut out = Stage::new(resolver.clone())
        .named("resolver")
        .with_workers(workers)
        .with_output_capacity(workers)
        .run(ctx, StageStream::from(rx));
    let stats = out.stats();

    while let Some((host, addr)) = out.next().await {
        println!("{host} -> {}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3]);
    }

    eprintln!();
    eprintln!("Canceled:");
    if let Ok(failed) = resolver.failed.lock() {
        for (host, reason) in failed.iter() {
            eprintln!("  {host}: {reason}");
        }
    }

    let snapshot = stats.snapshot();
    eprintln!();
    eprintln!(
        "fetched={} emitted={} canceled={}",
        snapshot.fetched, snapshot.emitted, snapshot.canceled
    );

    Ok(())
}
