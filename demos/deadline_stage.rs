//! Example: Sequential Stage with Deadline and Ctrl+C
//!
//! A producer emits a reading every 50ms for three seconds. A single worker
//! "calibrates" each reading. The stage context expires after the given
//! deadline or on Ctrl+C, whichever comes first; from then on readings are
//! canceled, but the output stays open until the producer stops.
//!
//! Usage:
//!   cargo run --example deadline_stage -- [deadline_ms]

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use stagecraft::prelude::*;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

#[derive(Error, Debug)]
#[error("reading {0} out of range")]
struct OutOfRange(i64);

struct Calibrator {
    offset: i64,
}

#[async_trait]
impl Transformer<i64> for Calibrator {
    type Output = i64;
    type Error = OutOfRange;

    async fn transform(&self, _ctx: &Context, reading: &i64) -> Result<i64, OutOfRange> {
        sleep(Duration::from_millis(30)).await;
        if reading % 13 == 0 {
            return Err(OutOfRange(*reading));
        }
        Ok(reading + self.offset)
    }

    async fn cancel(&self, reading: i64, error: StageError<OutOfRange>) {
        eprintln!("  canceled {reading}: {error}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let deadline_ms: u64 = args
        .get(1)
        .map(|s| s.parse::<u64>())
        .transpose()?
        .unwrap_or(1_500);

    eprintln!("=== Deadline Stage Example ===");
    eprintln!("Deadline: {}ms (Ctrl+C cancels early)", deadline_ms);
    eprintln!();

    let ctx = Context::with_timeout(Duration::from_millis(deadline_ms));

    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Received Ctrl+C, canceling stage context");
            interrupt.cancel();
        }
    });

    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let stop = Instant::now() + Duration::from_secs(3);
        let mut reading = 0i64;
        while Instant::now() < stop {
            if tx.send(reading).await.is_err() {
                break;
            }
            reading += 1;
            sleep(Duration::from_millis(50)).await;
        }
    });

    let started = Instant::now();
    let mut out = process(ctx.clone(), Calibrator { offset: 1_000 }, StageStream::from(rx));
    let stats = out.stats();

    while let Some(value) = out.recv().await {
        println!("{:>6}ms  {value}", started.elapsed().as_millis());
    }

    let snapshot = stats.snapshot();
    eprintln!();
    eprintln!(
        "Output closed after {}ms (context: {})",
        started.elapsed().as_millis(),
        ctx.err().map_or("live".to_string(), |e| e.to_string())
    );
    eprintln!(
        "fetched={} emitted={} canceled={}",
        snapshot.fetched, snapshot.emitted, snapshot.canceled
    );

    Ok(())
}
