//! Event processors: the consumer-side run loops driven off a
//! [`crate::sequence_barrier::SequenceBarrier`].
//!
//! [`BatchEventProcessor`] is exclusive consumption (one processor sees
//! every sequence); [`WorkProcessor`]/[`WorkerPool`] is competitive
//! consumption (sequences are partitioned across sibling workers via a CAS
//! on a shared work sequence). Both share the same tri-state run flag and
//! lifecycle shape, grounded on the teacher's processor-loop style in
//! `disruptor/spsc/ring_consumer.rs` (poll the barrier, deliver, advance own
//! sequence, repeat until alerted).

mod batch_event_processor;
mod work_processor;
mod worker_pool;

pub use batch_event_processor::BatchEventProcessor;
pub use work_processor::WorkProcessor;
pub use worker_pool::WorkerPool;

use std::sync::atomic::{AtomicI32, Ordering};

const IDLE: i32 = 0;
const RUNNING: i32 = 1;
const HALTED: i32 = 2;

/// Tri-state run flag shared by both processor kinds: CAS'd `idle ->
/// running` on start to reject a double-start, flipped to `halted` by
/// `halt()`, and reset to `idle` when the run loop exits.
pub(crate) struct RunState(AtomicI32);

impl RunState {
    pub(crate) fn new() -> Self {
        Self(AtomicI32::new(IDLE))
    }

    /// Attempt `idle -> running`. Returns whether this call won the race.
    pub(crate) fn try_start(&self) -> bool {
        self.0
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn halt(&self) {
        self.0.store(HALTED, Ordering::SeqCst);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst) == RUNNING
    }

    pub(crate) fn reset_to_idle(&self) {
        self.0.store(IDLE, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_start_is_rejected() {
        let state = RunState::new();
        assert!(state.try_start());
        assert!(!state.try_start());
    }

    #[test]
    fn test_halt_then_restart() {
        let state = RunState::new();
        assert!(state.try_start());
        state.halt();
        assert!(!state.is_running());
        state.reset_to_idle();
        assert!(state.try_start());
    }
}
