//! Single-producer and multi-producer claim/publish throughput, and the
//! exclusive-consumer drain rate behind a [`gyre::BatchEventProcessor`].

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;

use gyre::prelude::*;

const RING_SIZE: usize = 1 << 16;

fn bench_single_producer_claim_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_producer_claim_publish");
    for batch in [1usize, 16, 256] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            let buffer = RingBuffer::create_single_producer(
                &(|| 0i64),
                RING_SIZE,
                Arc::new(BusySpinWaitStrategy::new()),
            )
            .unwrap();
            let consumed = Arc::new(Sequence::new());
            buffer.add_gating_sequences(&[consumed.clone()]);

            b.iter(|| {
                let high = buffer.next(batch as i64);
                for seq in (high - batch as i64 + 1)..=high {
                    *buffer.claim_and_get_preallocated(seq) = seq;
                }
                buffer.publish(high - batch as i64 + 1, high);
                consumed.set(high);
            });
        });
    }
    group.finish();
}

fn bench_multi_producer_contended_claim(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_producer_contended_claim");
    for producers in [2usize, 4, 8] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(producers), &producers, |b, &producers| {
            let buffer = RingBuffer::create_multi_producer(
                &(|| 0i64),
                RING_SIZE,
                Arc::new(BusySpinWaitStrategy::new()),
            )
            .unwrap();
            let consumed = Arc::new(Sequence::new());
            buffer.add_gating_sequences(&[consumed.clone()]);
            let high_water = Arc::new(AtomicI64::new(-1));

            b.iter_custom(|iters| {
                let per_producer = iters / producers as u64;
                let start = std::time::Instant::now();
                thread::scope(|scope| {
                    for _ in 0..producers {
                        let buffer = buffer.clone();
                        let high_water = high_water.clone();
                        scope.spawn(move || {
                            for _ in 0..per_producer {
                                let seq = buffer.next(1);
                                *buffer.claim_and_get_preallocated(seq) = seq;
                                buffer.publish(seq, seq);
                                high_water.fetch_max(seq, Ordering::Relaxed);
                            }
                        });
                    }
                });
                consumed.set(high_water.load(Ordering::Relaxed));
                start.elapsed()
            });
        });
    }
    group.finish();
}

fn bench_batch_event_processor_drain(c: &mut Criterion) {
    c.bench_function("batch_event_processor_drain_1m", |b| {
        b.iter_custom(|iters| {
            let total = 1_000_000u64;
            let buffer = RingBuffer::create_single_producer(
                &(|| 0u64),
                RING_SIZE,
                Arc::new(BusySpinWaitStrategy::new()),
            )
            .unwrap();

            struct CountingHandler(Arc<AtomicI64>);
            impl EventHandler<u64> for CountingHandler {
                fn on_event(&self, _event: &u64, _sequence: i64, _end_of_batch: bool) -> Result<()> {
                    self.0.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
            }
            struct NoopExceptionHandler;
            impl ExceptionHandler<u64> for NoopExceptionHandler {
                fn handle_event_exception(&self, _e: &DisruptorError, _s: i64, _ev: &u64) {}
                fn handle_on_start_exception(&self, _e: &DisruptorError) -> Result<()> {
                    Ok(())
                }
                fn handle_on_shutdown_exception(&self, _e: &DisruptorError) -> Result<()> {
                    Ok(())
                }
            }

            let mut total_elapsed = std::time::Duration::ZERO;
            for _ in 0..iters {
                let processed = Arc::new(AtomicI64::new(0));
                let barrier = buffer.new_barrier(Vec::new());
                let processor = Arc::new(BatchEventProcessor::new(
                    buffer.clone(),
                    barrier,
                    Arc::new(CountingHandler(processed.clone())),
                    Arc::new(NoopExceptionHandler),
                ));
                let runner = processor.clone();
                let handle = thread::spawn(move || runner.run());

                let start = std::time::Instant::now();
                for _ in 0..total {
                    let seq = buffer.next(1);
                    buffer.publish(seq, seq);
                }
                while processed.load(Ordering::Relaxed) < total as i64 {
                    std::hint::spin_loop();
                }
                total_elapsed += start.elapsed();

                processor.halt();
                handle.join().unwrap().unwrap();
            }
            total_elapsed
        });
    });
}

criterion_group!(
    benches,
    bench_single_producer_claim_publish,
    bench_multi_producer_contended_claim,
    bench_batch_event_processor_drain
);
criterion_main!(benches);
