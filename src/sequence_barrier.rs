//! Consumer-facing wait point: bridges a sequencer's producer cursor and a
//! set of upstream consumer sequences into a single `wait_for(target)` call.
//!
//! Grounded on the teacher's wait-strategy/cursor pairing in
//! `disruptor/spsc/ring_consumer.rs`, generalized here to also gate on
//! upstream consumers (a barrier's dependent set), not just the producer
//! cursor, so that processors can be chained.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{DisruptorError, Result};
use crate::sequence::Sequence;
use crate::sequence_group::SequenceGroup;
use crate::sequencer::Sequencer;
use crate::wait_strategy::{Alertable, WaitStrategy};

/// Gates a consumer's progress on a producer cursor and any upstream
/// consumers it must not overtake.
///
/// Owns an `alerted` flag a [`crate::processor`] halts through: setting it
/// wakes any in-progress `wait_for` with [`DisruptorError::Alert`] instead of
/// letting it block forever past a shutdown request.
pub struct SequenceBarrier {
    sequencer: Arc<dyn Sequencer>,
    cursor: Arc<Sequence>,
    wait_strategy: Arc<dyn WaitStrategy>,
    dependent_sequences: SequenceGroup,
    alerted: AtomicBool,
}

struct AlertFlag<'a>(&'a AtomicBool);

impl Alertable for AlertFlag<'_> {
    fn is_alerted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl SequenceBarrier {
    /// Build a barrier gated on `cursor` (the sequencer's producer cursor)
    /// plus `dependent_sequences` (other consumers that must finish first).
    /// When `dependent_sequences` is empty, the barrier gates on the cursor
    /// alone.
    pub fn new(
        sequencer: Arc<dyn Sequencer>,
        cursor: Arc<Sequence>,
        wait_strategy: Arc<dyn WaitStrategy>,
        dependent_sequences: Vec<Arc<Sequence>>,
    ) -> Self {
        let group = SequenceGroup::new();
        for s in dependent_sequences {
            group.add(s);
        }
        Self {
            sequencer,
            cursor,
            wait_strategy,
            dependent_sequences: group,
            alerted: AtomicBool::new(false),
        }
    }

    /// Wait until `target` is available, returning the highest contiguous
    /// sequence actually safe to read (which may exceed `target`).
    ///
    /// If the wait strategy reports an `available` sequence below `target`,
    /// that means a dependent consumer has only partially caught up; this
    /// returns `available` as-is so the caller retries rather than reading
    /// past what upstream has processed. Otherwise this reconciles against
    /// the sequencer's own availability tracking, since a multi-producer
    /// sequencer's cursor can advance past sequences that are claimed but
    /// not yet published.
    pub fn wait_for(&self, target: i64) -> Result<i64> {
        self.check_alert()?;

        let available = self.wait_strategy.wait_for(
            target,
            &self.cursor,
            &self.dependent_sequences,
            &AlertFlag(&self.alerted),
        )?;

        if available < target {
            return Ok(available);
        }
        Ok(self.sequencer.get_highest_published_sequence(target, available))
    }

    /// Request that any in-progress or future [`SequenceBarrier::wait_for`]
    /// return [`DisruptorError::Alert`].
    pub fn alert(&self) {
        self.alerted.store(true, Ordering::Release);
        self.wait_strategy.signal_all_when_blocking();
    }

    /// Clear a previously-set alert, allowing [`SequenceBarrier::wait_for`]
    /// to block normally again.
    pub fn clear_alert(&self) {
        self.alerted.store(false, Ordering::Release);
    }

    /// Whether an alert is currently set.
    pub fn is_alerted(&self) -> bool {
        self.alerted.load(Ordering::Acquire)
    }

    /// Returns [`DisruptorError::Alert`] if an alert is set.
    pub fn check_alert(&self) -> Result<()> {
        if self.is_alerted() {
            Err(DisruptorError::Alert)
        } else {
            Ok(())
        }
    }

    /// Minimum of the dependent sequences, or the producer cursor if there
    /// are none.
    pub fn get_cursor(&self) -> i64 {
        if self.dependent_sequences.count() == 0 {
            self.cursor.get()
        } else {
            self.dependent_sequences.get()
        }
    }

    /// Register an additional dependent sequence (used when chaining a new
    /// processor onto an already-running barrier).
    pub fn add_dependent_sequence(&self, sequence: Arc<Sequence>) {
        self.dependent_sequences.add(sequence);
    }
}
