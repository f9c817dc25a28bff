use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use futures::{StreamExt, stream};
use stagecraft::prelude::*;
use tokio::runtime::Runtime;

/// Checksum over a small buffer, yielding once so workers interleave
struct Checksum;

#[async_trait]
impl Transformer<Vec<u8>> for Checksum {
    type Output = u32;
    type Error = Infallible;

    async fn transform(&self, _ctx: &Context, item: &Vec<u8>) -> Result<u32, Infallible> {
        tokio::task::yield_now().await;
        Ok(item
            .iter()
            .fold(0u32, |acc, b| acc.rotate_left(5) ^ u32::from(*b)))
    }

    async fn cancel(&self, _item: Vec<u8>, _error: StageError<Infallible>) {}
}

fn payloads(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| (0..256).map(|b| (b ^ i) as u8).collect())
        .collect()
}

/// Sequential stage vs worker pools of increasing size over the same input
fn bench_worker_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker_scaling");
    let runtime = Runtime::new().unwrap();
    let transformer = Arc::new(Checksum);

    group.bench_function("sequential", |b| {
        b.to_async(&runtime).iter(|| {
            let transformer = Arc::clone(&transformer);
            async move {
                let out = process(Context::background(), transformer, stream::iter(payloads(1_000)));
                black_box(out.collect::<Vec<_>>().await)
            }
        });
    });

    for workers in [1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("concurrent", workers),
            &workers,
            |b, &workers| {
                b.to_async(&runtime).iter(|| {
                    let transformer = Arc::clone(&transformer);
                    async move {
                        let out = process_concurrently(
                            Context::background(),
                            workers,
                            transformer,
                            stream::iter(payloads(1_000)),
                        );
                        black_box(out.collect::<Vec<_>>().await)
                    }
                });
            },
        );
    }

    group.finish();
}

/// Cost of the cancel path once the context has already expired
fn bench_expired_drain(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let transformer = Arc::new(Checksum);

    c.bench_function("expired_drain", |b| {
        b.to_async(&runtime).iter(|| {
            let transformer = Arc::clone(&transformer);
            async move {
                let ctx = Context::background();
                ctx.cancel();
                let out = process_concurrently(ctx, 4, transformer, stream::iter(payloads(1_000)));
                black_box(out.collect::<Vec<_>>().await)
            }
        });
    });
}

criterion_group!(benches, bench_worker_scaling, bench_expired_drain);
criterion_main!(benches);
