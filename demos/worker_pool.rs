//! Three competitive workers partitioning a stream of published jobs,
//! drained and halted once the producer stops.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gyre::prelude::*;

struct SquaringWorker {
    id: usize,
    processed: Arc<AtomicU64>,
}

impl WorkHandler<u64> for SquaringWorker {
    fn on_event(&self, event: &u64, sequence: i64) -> Result<()> {
        let squared = event.wrapping_mul(*event);
        self.processed.fetch_add(1, Ordering::Relaxed);
        println!("worker {} squared job {sequence}: {event} -> {squared}", self.id);
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let buffer = RingBufferConfig::new(256)?
        .with_producer_type(ProducerType::Multi)
        .with_wait_strategy(WaitStrategyKind::Blocking)
        .build::<u64>(&|| 0u64)?;

    let processed = Arc::new(AtomicU64::new(0));
    let handlers: Vec<Arc<dyn WorkHandler<u64>>> = (0..3)
        .map(|id| Arc::new(SquaringWorker { id, processed: processed.clone() }) as Arc<dyn WorkHandler<u64>>)
        .collect();

    let pool = WorkerPool::new(buffer.clone(), handlers, Arc::new(LoggingExceptionHandler::<u64>::new()));
    let executor = ThreadExecutor::new();
    pool.start(&executor)?;

    for job in 0..50u64 {
        let seq = buffer.next(1);
        *buffer.claim_and_get_preallocated(seq) = job;
        buffer.publish(seq, seq);
    }

    pool.drain_and_halt();
    println!("pool drained, {} jobs processed", processed.load(Ordering::Relaxed));
    Ok(())
}
