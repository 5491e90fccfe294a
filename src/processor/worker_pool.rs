//! Composes one [`WorkProcessor`] per [`WorkHandler`] over a shared work
//! sequence, so a batch of published events is partitioned across the pool
//! with each sequence delivered to exactly one worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{DisruptorError, Result};
use crate::processor::WorkProcessor;
use crate::ring_buffer::RingBuffer;
use crate::sequence::Sequence;
use crate::sequence_barrier::SequenceBarrier;
use crate::traits::{ExceptionHandler, Executor, WorkHandler};

pub struct WorkerPool<E> {
    ring_buffer: Arc<RingBuffer<E>>,
    barrier: Arc<SequenceBarrier>,
    processors: Vec<Arc<WorkProcessor<E>>>,
    started: AtomicBool,
}

impl<E: Send + Sync + 'static> WorkerPool<E> {
    /// Build one [`WorkProcessor`] per entry in `handlers`, all sharing a
    /// single work sequence initialized to −1 and a single barrier gated on
    /// the ring buffer's cursor.
    pub fn new(
        ring_buffer: Arc<RingBuffer<E>>,
        handlers: Vec<Arc<dyn WorkHandler<E>>>,
        exception_handler: Arc<dyn ExceptionHandler<E>>,
    ) -> Self {
        let work_sequence = Arc::new(Sequence::new());
        let barrier = Arc::new(ring_buffer.new_barrier(Vec::new()));

        let processors = handlers
            .into_iter()
            .map(|handler| {
                Arc::new(WorkProcessor::new(
                    ring_buffer.clone(),
                    barrier.clone(),
                    handler,
                    exception_handler.clone(),
                    work_sequence.clone(),
                ))
            })
            .collect();

        Self {
            ring_buffer,
            barrier,
            processors,
            started: AtomicBool::new(false),
        }
    }

    /// Sequences of every worker in the pool, for registering as gating
    /// sequences on an upstream ring buffer or for `drain_and_halt` polling.
    pub fn worker_sequences(&self) -> Vec<Arc<Sequence>> {
        self.processors.iter().map(|p| p.sequence_handle()).collect()
    }

    /// Start every worker on `executor`. Single-use: a second call returns
    /// `IllegalState` without starting anything.
    pub fn start(&self, executor: &dyn Executor) -> Result<()> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DisruptorError::illegal_state("worker pool already started"));
        }

        let cursor = self.ring_buffer.cursor();
        for processor in &self.processors {
            processor.sequence_handle().set(cursor);
        }

        self.ring_buffer.add_gating_sequences(&self.worker_sequences());

        for processor in self.processors.clone() {
            executor.execute(Box::new(move || {
                if let Err(error) = processor.run() {
                    tracing::error!(%error, "work processor exited with an error");
                }
            }));
        }
        Ok(())
    }

    /// Block until every published sequence has been consumed by some
    /// worker, then halt the pool.
    pub fn drain_and_halt(&self) {
        while self.ring_buffer.cursor() > self.minimum_worker_sequence() {
            thread::sleep(Duration::from_micros(1));
        }
        self.halt();
    }

    fn minimum_worker_sequence(&self) -> i64 {
        self.processors
            .iter()
            .map(|p| p.get_sequence())
            .min()
            .unwrap_or(i64::MAX)
    }

    /// Alert every worker and clear the started flag so the pool could be
    /// restarted (workers themselves are single-use, but the flag reset
    /// matches the spec's "clear the started flag" contract).
    pub fn halt(&self) {
        for processor in &self.processors {
            processor.halt();
        }
        self.barrier.alert();
        self.started.store(false, Ordering::SeqCst);
    }
}
