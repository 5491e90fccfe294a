//! Exclusive consumer loop: one processor sees every published sequence in
//! order, delivered in batches bounded by what a single `wait_for` observed
//! as available.

use std::sync::Arc;

use crate::error::{DisruptorError, Result};
use crate::processor::RunState;
use crate::ring_buffer::RingBuffer;
use crate::sequence::Sequence;
use crate::sequence_barrier::SequenceBarrier;
use crate::traits::{EventHandler, ExceptionHandler};

/// Drives an [`EventHandler`] over every sequence a [`SequenceBarrier`]
/// releases, in strictly increasing order with no gaps.
pub struct BatchEventProcessor<E> {
    ring_buffer: Arc<RingBuffer<E>>,
    barrier: SequenceBarrier,
    handler: Arc<dyn EventHandler<E>>,
    exception_handler: Arc<dyn ExceptionHandler<E>>,
    sequence: Arc<Sequence>,
    state: RunState,
}

impl<E: 'static> BatchEventProcessor<E> {
    pub fn new(
        ring_buffer: Arc<RingBuffer<E>>,
        barrier: SequenceBarrier,
        handler: Arc<dyn EventHandler<E>>,
        exception_handler: Arc<dyn ExceptionHandler<E>>,
    ) -> Self {
        Self {
            ring_buffer,
            barrier,
            handler,
            exception_handler,
            sequence: Arc::new(Sequence::new()),
            state: RunState::new(),
        }
    }

    /// Handle to this processor's own sequence, for registering as a
    /// gating/dependent sequence elsewhere.
    pub fn sequence_handle(&self) -> Arc<Sequence> {
        self.sequence.clone()
    }

    pub fn get_sequence(&self) -> i64 {
        self.sequence.get()
    }

    /// Request the run loop stop at the next wait-strategy poll.
    pub fn halt(&self) {
        self.state.halt();
        self.barrier.alert();
    }

    /// Run the consume loop on the calling thread until [`Self::halt`] is
    /// called. Returns an error if the processor was already running, or if
    /// a lifecycle hook failed and re-raised.
    pub fn run(&self) -> Result<()> {
        if !self.state.try_start() {
            return Err(DisruptorError::illegal_state(
                "batch event processor is already running",
            ));
        }
        self.barrier.clear_alert();

        if let Err(e) = self.handler.on_start() {
            let _ = self.exception_handler.handle_on_start_exception(&e);
            self.state.reset_to_idle();
            return Err(e);
        }
        tracing::info!("batch event processor started");

        let mut next_sequence = self.sequence.get() + 1;

        loop {
            match self.barrier.wait_for(next_sequence) {
                Ok(available) if available >= next_sequence => {
                    while next_sequence <= available {
                        let event = self.ring_buffer.get(next_sequence);
                        let end_of_batch = next_sequence == available;
                        if let Err(e) = self.handler.on_event(event, next_sequence, end_of_batch) {
                            self.exception_handler
                                .handle_event_exception(&e, next_sequence, event);
                        }
                        next_sequence += 1;
                    }
                    // Publish once per batch, not per event: the sequence
                    // only needs to be visible to gating producers/barriers
                    // after the whole contiguous run has been delivered.
                    self.sequence.set(available);
                }
                Ok(_) => {
                    // Barrier reported less progress than requested (a
                    // dependent consumer hasn't caught up); retry.
                }
                Err(DisruptorError::Alert) => {
                    if !self.state.is_running() {
                        break;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!("batch event processor halted");
        let shutdown_result = self.handler.on_shutdown();
        self.state.reset_to_idle();
        if let Err(e) = shutdown_result {
            return self.exception_handler.handle_on_shutdown_exception(&e);
        }
        Ok(())
    }
}
