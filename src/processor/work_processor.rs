//! Competitive consumer loop: sibling [`WorkProcessor`]s CAS a single shared
//! work sequence to partition published sequences between them, so each
//! sequence is delivered to exactly one worker.

use std::sync::Arc;

use crate::error::{DisruptorError, Result};
use crate::processor::RunState;
use crate::ring_buffer::RingBuffer;
use crate::sequence::Sequence;
use crate::sequence_barrier::SequenceBarrier;
use crate::traits::{ExceptionHandler, WorkHandler};

/// One competitive worker over a shared `work_sequence`, constructed and
/// owned by a [`crate::processor::WorkerPool`].
pub struct WorkProcessor<E> {
    ring_buffer: Arc<RingBuffer<E>>,
    barrier: Arc<SequenceBarrier>,
    work_handler: Arc<dyn WorkHandler<E>>,
    exception_handler: Arc<dyn ExceptionHandler<E>>,
    work_sequence: Arc<Sequence>,
    sequence: Arc<Sequence>,
    state: RunState,
}

impl<E: 'static> WorkProcessor<E> {
    /// `barrier` is shared across every worker in the pool (the same `Arc`),
    /// so halting it alerts every sibling at once.
    pub fn new(
        ring_buffer: Arc<RingBuffer<E>>,
        barrier: Arc<SequenceBarrier>,
        work_handler: Arc<dyn WorkHandler<E>>,
        exception_handler: Arc<dyn ExceptionHandler<E>>,
        work_sequence: Arc<Sequence>,
    ) -> Self {
        Self {
            ring_buffer,
            barrier,
            work_handler,
            exception_handler,
            work_sequence,
            sequence: Arc::new(Sequence::new()),
            state: RunState::new(),
        }
    }

    pub fn sequence_handle(&self) -> Arc<Sequence> {
        self.sequence.clone()
    }

    pub fn get_sequence(&self) -> i64 {
        self.sequence.get()
    }

    pub fn halt(&self) {
        self.state.halt();
        self.barrier.alert();
    }

    /// Run the competitive-claim loop on the calling thread until
    /// [`Self::halt`] is called.
    pub fn run(&self) -> Result<()> {
        if !self.state.try_start() {
            return Err(DisruptorError::illegal_state(
                "work processor is already running",
            ));
        }
        self.barrier.clear_alert();
        tracing::info!("work processor started");

        'outer: loop {
            if !self.state.is_running() {
                break;
            }

            // Competitively claim the next sequence: CAS the shared work
            // sequence from `w` to `w + 1`.
            let claimed = loop {
                let current = self.work_sequence.get();
                let next = current + 1;
                if self.work_sequence.compare_and_set(current, next) {
                    break next;
                }
            };
            // Every sequence below `claimed` has now been claimed by some
            // sibling, whether or not it has finished processing. Advancing
            // our own sequence here, not only after processing `claimed`,
            // keeps drain_and_halt's min-of-worker-sequences convergent even
            // when this worker races ahead and blocks on a not-yet-published
            // claim; otherwise a worker parked on a future sequence would
            // hold its old, much lower sequence forever.
            self.sequence.set(claimed - 1);

            loop {
                match self.barrier.wait_for(claimed) {
                    Ok(available) if available >= claimed => break,
                    Ok(_) => continue,
                    Err(DisruptorError::Alert) => {
                        if !self.state.is_running() {
                            break 'outer;
                        }
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            let event = self.ring_buffer.get(claimed);
            if let Err(e) = self.work_handler.on_event(event, claimed) {
                self.exception_handler.handle_event_exception(&e, claimed, event);
            }
            self.sequence.set(claimed);
        }

        tracing::info!("work processor halted");
        self.state.reset_to_idle();
        Ok(())
    }
}
