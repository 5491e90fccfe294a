//! Multi-producer sequencer: claims are CAS'd on the cursor, and since two
//! producers can publish out of claim-order, availability is tracked
//! per-slot rather than by a single cursor store.

use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};
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

/// Sequencer for the multi-producer case.
///
/// `available` is the per-slot publication flag array described in the
/// data model: `available[s & mask]` holds `s >> log2(size)` once sequence
/// `s` has been published into that slot. A consumer can only tell two
/// producers' writes apart by this flag — the cursor alone tells you the
/// *highest claimed* sequence, not the highest *contiguously published*
/// one.
pub struct MultiProducerSequencer {
    buffer_size: usize,
    index_mask: i64,
    index_shift: u32,
    cursor: Arc<Sequence>,
    gating_sequences: SequenceGroup,
    gating_cache: AtomicI64,
    wait_strategy: Arc<dyn WaitStrategy>,
    available: Box<[AtomicI32]>,
}

impl MultiProducerSequencer {
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
        let available = (0..buffer_size).map(|_| AtomicI32::new(-1)).collect();
        Ok(Self {
            buffer_size,
            index_mask: buffer_size as i64 - 1,
            index_shift: buffer_size.trailing_zeros(),
            cursor: Arc::new(Sequence::new()),
            gating_sequences: SequenceGroup::new(),
            gating_cache: AtomicI64::new(Sequence::INITIAL_VALUE),
            wait_strategy,
            available,
        })
    }

    pub fn cursor_handle(&self) -> Arc<Sequence> {
        self.cursor.clone()
    }

    pub fn new_barrier(self: Arc<Self>, dependent_sequences: Vec<Arc<Sequence>>) -> SequenceBarrier {
        let wait_strategy = self.wait_strategy.clone();
        let cursor = self.cursor.clone();
        SequenceBarrier::new(self as Arc<dyn Sequencer>, cursor, wait_strategy, dependent_sequences)
    }

    #[inline(always)]
    fn index(&self, sequence: i64) -> usize {
        (sequence & self.index_mask) as usize
    }

    #[inline(always)]
    fn availability_flag(&self, sequence: i64) -> i32 {
        (sequence >> self.index_shift) as i32
    }

    fn set_available(&self, sequence: i64) {
        let idx = self.index(sequence);
        self.available[idx].store(self.availability_flag(sequence), Ordering::Release);
    }
}

impl Sequencer for MultiProducerSequencer {
    fn next(&self, n: i64) -> i64 {
        loop {
            match self.try_claim(n, true) {
                Ok(seq) => return seq,
                Err(DisruptorError::InsufficientCapacity) => {
                    thread::sleep(Duration::from_nanos(1));
                }
                Err(e) => panic!("blocking next() hit a non-capacity error: {e}"),
            }
        }
    }

    fn try_next(&self, n: i64) -> Result<i64> {
        self.try_claim(n, false)
    }

    fn publish(&self, low: i64, high: i64) {
        for s in low..=high {
            self.set_available(s);
        }
        self.wait_strategy.signal_all_when_blocking();
    }

    fn is_available(&self, sequence: i64) -> bool {
        let idx = self.index(sequence);
        self.available[idx].load(Ordering::Acquire) == self.availability_flag(sequence)
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

    fn get_highest_published_sequence(&self, lower_bound: i64, available_sequence: i64) -> i64 {
        let mut sequence = lower_bound;
        while sequence <= available_sequence {
            if !self.is_available(sequence) {
                return sequence - 1;
            }
            sequence += 1;
        }
        available_sequence
    }

    fn claim(&self, sequence: i64) {
        self.cursor.set(sequence);
    }

    fn cursor(&self) -> i64 {
        self.cursor.get()
    }

    fn remaining_capacity(&self) -> i64 {
        let consumed = self.gating_sequences.get();
        let produced = self.cursor.get();
        self.buffer_size as i64 - (produced - consumed)
    }

    fn has_available_capacity(&self, n: i64) -> bool {
        self.has_capacity(n, self.cursor.get())
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl MultiProducerSequencer {
    fn has_capacity(&self, n: i64, current: i64) -> bool {
        let next_sequence = current + n;
        let wrap_point = next_sequence - self.buffer_size as i64;
        let cached_gating = self.gating_cache.load(Ordering::Relaxed);

        if wrap_point > cached_gating || cached_gating > current {
            let min_sequence = self.gating_sequences.get().min(current);
            self.gating_cache.store(min_sequence, Ordering::Relaxed);
            wrap_point <= min_sequence
        } else {
            true
        }
    }

    fn try_claim(&self, n: i64, blocking: bool) -> Result<i64> {
        if n < 1 || n as usize > self.buffer_size {
            return Err(DisruptorError::invalid_argument(
                "claimed batch size must be between 1 and the buffer size",
            ));
        }

        loop {
            let current = self.cursor.get();
            let next_sequence = current + n;
            let wrap_point = next_sequence - self.buffer_size as i64;
            let cached_gating = self.gating_cache.load(Ordering::Relaxed);

            if wrap_point > cached_gating || cached_gating > current {
                let min_sequence = self.gating_sequences.get().min(current);
                self.gating_cache.store(min_sequence, Ordering::Relaxed);

                if wrap_point > min_sequence {
                    if !blocking {
                        return Err(DisruptorError::InsufficientCapacity);
                    }
                    thread::sleep(Duration::from_nanos(1));
                    continue;
                }
            }

            if self.cursor.compare_and_set(current, next_sequence) {
                return Ok(next_sequence);
            }
            // Lost the race to another producer; retry from the top so the
            // gating check is re-evaluated against the new cursor.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait_strategy::BusySpinWaitStrategy;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn sequencer(size: usize) -> MultiProducerSequencer {
        MultiProducerSequencer::new(size, Arc::new(BusySpinWaitStrategy::new())).unwrap()
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(MultiProducerSequencer::new(3, Arc::new(BusySpinWaitStrategy::new())).is_err());
    }

    #[test]
    fn test_claim_and_publish_round_trip() {
        let seq = sequencer(8);
        let high = seq.next(3);
        assert_eq!(high, 2);
        assert!(!seq.is_available(0));
        seq.publish(0, high);
        assert!(seq.is_available(0));
        assert!(seq.is_available(2));
    }

    #[test]
    fn test_get_highest_published_sequence_stops_at_gap() {
        let seq = sequencer(8);
        let high = seq.next(3);
        // Publish only the last slot: 0 and 1 remain unpublished, simulating
        // a slower producer still writing into its claimed range.
        seq.publish(2, 2);
        assert_eq!(seq.get_highest_published_sequence(0, high), -1);

        seq.publish(0, 1);
        assert_eq!(seq.get_highest_published_sequence(0, high), 2);
    }

    #[test]
    fn test_concurrent_claims_are_unique_and_contiguous() {
        let seq = Arc::new(sequencer(1024));
        let seen = Arc::new(Mutex::new(HashSet::new()));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let seq = seq.clone();
            let seen = seen.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let high = seq.next(1);
                    seq.publish(high, high);
                    assert!(seen.lock().unwrap().insert(high));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 800);
    }

    #[test]
    fn test_try_next_insufficient_capacity() {
        let seq = sequencer(4);
        let gating = Arc::new(Sequence::with_initial_value(-1));
        seq.add_gating_sequences(&[gating.clone()]);

        let high = seq.next(4);
        seq.publish(0, high);

        assert!(matches!(
            seq.try_next(1),
            Err(DisruptorError::InsufficientCapacity)
        ));
        gating.set(0);
        assert!(seq.try_next(1).is_ok());
    }

    #[test]
    fn test_claiming_more_than_buffer_is_invalid() {
        let seq = sequencer(8);
        assert!(matches!(
            seq.try_next(9),
            Err(DisruptorError::InvalidArgument { .. })
        ));
    }
}
