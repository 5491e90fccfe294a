//! Single-producer sequencer: no CAS on the hot path because only one
//! thread ever calls `next`/`publish`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::constants::MAX_RING_BUFFER_SIZE;
use crate::error::{DisruptorError, Result};
use crate::sequence::Sequence;
use crate::sequence_barrier::SequenceBarrier;
use crate::sequence_group::SequenceGroup;
use crate::sequencer::Sequencer;
use crate::wait_strategy::WaitStrategy;

/// Sequencer for the single-producer case.
///
/// `next_value`/`cached_gating_value` are plain (non-atomic) fields: the
/// single-producer contract guarantees only one thread ever calls `next`,
/// so there is nothing to synchronize on the claim side. The cursor is
/// still atomic because consumers read it concurrently.
pub struct SingleProducerSequencer {
    buffer_size: usize,
    cursor: Arc<Sequence>,
    gating_sequences: SequenceGroup,
    wait_strategy: Arc<dyn WaitStrategy>,
    next_value: AtomicI64,
    cached_gating_value: AtomicI64,
}

impl SingleProducerSequencer {
    pub fn new(buffer_size: usize, wait_strategy: Arc<dyn WaitStrategy>) -> Result<Self> {
        if !buffer_size.is_power_of_two() || buffer_size == 0 {
            return Err(DisruptorError::invalid_argument(
                "buffer size must be a positive power of two",
            ));
        }
        if buffer_size > MAX_RING_BUFFER_SIZE {
            return Err(DisruptorError::invalid_argument(format!(
                "buffer size {buffer_size} exceeds the maximum of {MAX_RING_BUFFER_SIZE}"
            )));
        }
        Ok(Self {
            buffer_size,
            cursor: Arc::new(Sequence::new()),
            gating_sequences: SequenceGroup::new(),
            wait_strategy,
            next_value: AtomicI64::new(Sequence::INITIAL_VALUE),
            cached_gating_value: AtomicI64::new(Sequence::INITIAL_VALUE),
        })
    }

    pub fn cursor_handle(&self) -> Arc<Sequence> {
        self.cursor.clone()
    }

    /// Build a barrier gated on this sequencer. Consumes an `Arc` handle
    /// because [`SequenceBarrier`] keeps a `dyn Sequencer` trait object and
    /// constructing one requires giving up the concrete type.
    pub fn new_barrier(self: Arc<Self>, dependent_sequences: Vec<Arc<Sequence>>) -> SequenceBarrier {
        let wait_strategy = self.wait_strategy.clone();
        let cursor = self.cursor.clone();
        SequenceBarrier::new(self as Arc<dyn Sequencer>, cursor, wait_strategy, dependent_sequences)
    }

    fn next_impl(&self, n: i64, blocking: bool) -> Result<i64> {
        if n < 1 || n as usize > self.buffer_size {
            return Err(DisruptorError::invalid_argument(
                "claimed batch size must be between 1 and the buffer size",
            ));
        }

        let current = self.next_value.load(Ordering::Relaxed);
        let next_sequence = current + n;
        let wrap_point = next_sequence - self.buffer_size as i64;
        let mut cached_gating = self.cached_gating_value.load(Ordering::Relaxed);

        if wrap_point > cached_gating || cached_gating > current {
            loop {
                let min_sequence = self.gating_sequences.get().min(current);
                self.cached_gating_value.store(min_sequence, Ordering::Relaxed);
                cached_gating = min_sequence;

                if wrap_point <= cached_gating {
                    break;
                }
                if !blocking {
                    return Err(DisruptorError::InsufficientCapacity);
                }
                thread::sleep(Duration::from_nanos(1));
            }
        }

        self.next_value.store(next_sequence, Ordering::Relaxed);
        Ok(next_sequence)
    }
}

impl Sequencer for SingleProducerSequencer {
    fn next(&self, n: i64) -> i64 {
        self.next_impl(n, true)
            .expect("blocking next() only fails on invalid argument, which is a caller bug")
    }

    fn try_next(&self, n: i64) -> Result<i64> {
        self.next_impl(n, false)
    }

    fn publish(&self, _low: i64, high: i64) {
        self.cursor.set(high);
        self.wait_strategy.signal_all_when_blocking();
    }

    fn is_available(&self, sequence: i64) -> bool {
        sequence <= self.cursor.get()
    }

    fn add_gating_sequences(&self, sequences: &[Arc<Sequence>]) {
        for s in sequences {
            self.gating_sequences.add(s.clone());
        }
    }

    fn remove_gating_sequence(&self, sequence: &Arc<Sequence>) -> bool {
        self.gating_sequences.remove(sequence)
    }

    fn get_minimum_sequence(&self) -> i64 {
        self.gating_sequences.get()
    }

    fn get_highest_published_sequence(&self, _lower_bound: i64, available_sequence: i64) -> i64 {
        // The cursor only ever advances to a fully-published value, so
        // there is no gap to scan for, unlike the multi-producer case.
        available_sequence
    }

    fn claim(&self, sequence: i64) {
        self.next_value.store(sequence, Ordering::Relaxed);
        self.cursor.set(sequence);
    }

    fn cursor(&self) -> i64 {
        self.cursor.get()
    }

    fn remaining_capacity(&self) -> i64 {
        let consumed = self.gating_sequences.get();
        let produced = self.next_value.load(Ordering::Relaxed);
        self.buffer_size as i64 - (produced - consumed)
    }

    fn has_available_capacity(&self, n: i64) -> bool {
        let current = self.next_value.load(Ordering::Relaxed);
        let next_sequence = current + n;
        let wrap_point = next_sequence - self.buffer_size as i64;
        let cached_gating = self.cached_gating_value.load(Ordering::Relaxed);

        if wrap_point > cached_gating || cached_gating > current {
            let min_sequence = self.gating_sequences.get().min(current);
            self.cached_gating_value.store(min_sequence, Ordering::Relaxed);
            wrap_point <= min_sequence
        } else {
            true
        }
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait_strategy::BusySpinWaitStrategy;

    fn sequencer(size: usize) -> SingleProducerSequencer {
        SingleProducerSequencer::new(size, Arc::new(BusySpinWaitStrategy::new())).unwrap()
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(SingleProducerSequencer::new(3, Arc::new(BusySpinWaitStrategy::new())).is_err());
    }

    #[test]
    fn test_next_and_publish_advances_cursor() {
        let seq = sequencer(16);
        let high = seq.next(4);
        assert_eq!(high, 3);
        assert_eq!(seq.cursor(), -1);
        seq.publish(0, high);
        assert_eq!(seq.cursor(), 3);
    }

    #[test]
    fn test_claiming_full_buffer_is_legal() {
        let seq = sequencer(16);
        assert_eq!(seq.try_next(16).unwrap(), 15);
    }

    #[test]
    fn test_claiming_more_than_buffer_is_invalid() {
        let seq = sequencer(16);
        assert!(matches!(
            seq.try_next(17),
            Err(DisruptorError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_try_next_reports_insufficient_capacity() {
        let seq = sequencer(4);
        let gating = Arc::new(Sequence::with_initial_value(-1));
        seq.add_gating_sequences(&[gating.clone()]);

        seq.publish(0, seq.next(4));
        // Ring is full: the lone consumer hasn't advanced past -1 yet.
        assert!(matches!(
            seq.try_next(1),
            Err(DisruptorError::InsufficientCapacity)
        ));

        gating.set(0);
        assert_eq!(seq.try_next(1).unwrap(), 4);
    }

    #[test]
    fn test_scenario_s6_backpressure_blocks_then_unblocks() {
        let seq = Arc::new(sequencer(4));
        let consumer = Arc::new(Sequence::with_initial_value(-1));
        seq.add_gating_sequences(&[consumer.clone()]);

        seq.publish(0, seq.next(4));

        let producer = seq.clone();
        let handle = thread::spawn(move || producer.next(1));

        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());

        consumer.set(0);
        let claimed = handle.join().unwrap();
        assert_eq!(claimed, 4);
    }

    #[test]
    fn test_remove_gating_sequence_is_idempotent() {
        let seq = sequencer(16);
        let gating = Arc::new(Sequence::new());
        seq.add_gating_sequences(&[gating.clone()]);

        assert!(seq.remove_gating_sequence(&gating));
        assert!(!seq.remove_gating_sequence(&gating));
    }
}
