//! Slot allocation, availability tracking, and consumer gating.
//!
//! A sequencer is the producer-facing half of the ring buffer: it owns the
//! cursor, decides how far a producer may advance without lapping a
//! consumer, and (for the multi-producer variant) tracks which claimed
//! sequences have actually been published.
//!
//! Grounded on the teacher's `disruptor/spsc/ring_buffer.rs` for the
//! claim/publish shape (`try_claim` computing `next`, checking against the
//! consumer cursor with wrapping subtraction, `publish` doing a release
//! fence then a relaxed cursor store) and on `disruptor/spmc/spmc_ring_buffer.rs`
//! for the producer/consumer split when multiple parties share one buffer.
//! Both single- and multi-producer variants are expressed here as distinct
//! types behind one object-safe `Sequencer` trait, the way the teacher keeps
//! SPSC and SPMC as distinct ring buffer types rather than one buffer with
//! runtime branching.

mod multi_producer;
mod single_producer;

pub use multi_producer::MultiProducerSequencer;
pub use single_producer::SingleProducerSequencer;

use std::sync::Arc;

use crate::error::Result;
use crate::sequence::Sequence;
use crate::sequence_barrier::SequenceBarrier;

/// Object-safe contract shared by [`SingleProducerSequencer`] and
/// [`MultiProducerSequencer`].
///
/// `new_barrier` is deliberately not part of this trait: constructing a
/// [`SequenceBarrier`] needs an `Arc` handle back to the sequencer, which on
/// stable Rust means a `self: Arc<Self>` receiver — not usable through a
/// `dyn Sequencer` trait object. [`SequencerHandle`] below provides
/// `new_barrier` for callers that only have an owned handle.
pub trait Sequencer: Send + Sync {
    /// Claim `n` slots, blocking until they are free. Returns the highest
    /// sequence in the claimed range.
    fn next(&self, n: i64) -> i64;

    /// Non-blocking form of [`Sequencer::next`].
    fn try_next(&self, n: i64) -> Result<i64>;

    /// Publish the inclusive range `[low, high]`, making it visible to
    /// consumers.
    fn publish(&self, low: i64, high: i64);

    /// Whether `sequence` has been published and is safe to read.
    fn is_available(&self, sequence: i64) -> bool;

    /// Register sequences the sequencer must not lap.
    fn add_gating_sequences(&self, sequences: &[Arc<Sequence>]);

    /// Deregister a gating sequence. Returns whether it was present.
    fn remove_gating_sequence(&self, sequence: &Arc<Sequence>) -> bool;

    /// Minimum of all registered gating sequences (`i64::MAX` if none).
    fn get_minimum_sequence(&self) -> i64;

    /// Given a consumer's next-wanted sequence and the highest sequence the
    /// wait strategy observed as available, return the highest sequence
    /// that forms a *contiguous* run starting at `lower_bound` — the first
    /// gap (relevant only for multi-producer sequencers, where publication
    /// order and claim order can differ) stops the scan.
    fn get_highest_published_sequence(&self, lower_bound: i64, available_sequence: i64) -> i64;

    /// Racy reset used during ring buffer initialization/testing.
    fn claim(&self, sequence: i64);

    /// Highest published sequence (the producer cursor).
    fn cursor(&self) -> i64;

    /// Slots free to claim right now without blocking.
    fn remaining_capacity(&self) -> i64;

    /// Whether `n` slots could be claimed right now without blocking.
    fn has_available_capacity(&self, n: i64) -> bool;

    /// Size of the backing ring buffer.
    fn buffer_size(&self) -> usize;
}

/// An owned, clonable handle to either sequencer variant.
///
/// [`crate::ring_buffer::RingBuffer`] stores one of these so it can be
/// generic over producer arity without boxing every call through a
/// `dyn Sequencer` — the hot `next`/`publish` path instead matches the two
/// known variants, the same trade the teacher makes by keeping `RingBuffer`,
/// `SpmcRingBuffer`, etc. as distinct monomorphic types instead of one
/// dynamically-dispatched buffer.
#[derive(Clone)]
pub enum SequencerHandle {
    Single(Arc<SingleProducerSequencer>),
    Multi(Arc<MultiProducerSequencer>),
}

impl SequencerHandle {
    /// Build a [`SequenceBarrier`] gated on this sequencer's cursor plus the
    /// given dependent sequences.
    pub fn new_barrier(&self, dependent_sequences: Vec<Arc<Sequence>>) -> SequenceBarrier {
        match self {
            SequencerHandle::Single(s) => s.clone().new_barrier(dependent_sequences),
            SequencerHandle::Multi(s) => s.clone().new_barrier(dependent_sequences),
        }
    }

    /// Handle to this sequencer's cursor, suitable as a dependent sequence
    /// in a downstream barrier.
    pub fn cursor_handle(&self) -> Arc<Sequence> {
        match self {
            SequencerHandle::Single(s) => s.cursor_handle(),
            SequencerHandle::Multi(s) => s.cursor_handle(),
        }
    }

    fn as_dyn(&self) -> &dyn Sequencer {
        match self {
            SequencerHandle::Single(s) => s.as_ref(),
            SequencerHandle::Multi(s) => s.as_ref(),
        }
    }
}

impl Sequencer for SequencerHandle {
    fn next(&self, n: i64) -> i64 {
        self.as_dyn().next(n)
    }

    fn try_next(&self, n: i64) -> Result<i64> {
        self.as_dyn().try_next(n)
    }

    fn publish(&self, low: i64, high: i64) {
        self.as_dyn().publish(low, high)
    }

    fn is_available(&self, sequence: i64) -> bool {
        self.as_dyn().is_available(sequence)
    }

    fn add_gating_sequences(&self, sequences: &[Arc<Sequence>]) {
        self.as_dyn().add_gating_sequences(sequences)
    }

    fn remove_gating_sequence(&self, sequence: &Arc<Sequence>) -> bool {
        self.as_dyn().remove_gating_sequence(sequence)
    }

    fn get_minimum_sequence(&self) -> i64 {
        self.as_dyn().get_minimum_sequence()
    }

    fn get_highest_published_sequence(&self, lower_bound: i64, available_sequence: i64) -> i64 {
        self.as_dyn()
            .get_highest_published_sequence(lower_bound, available_sequence)
    }

    fn claim(&self, sequence: i64) {
        self.as_dyn().claim(sequence)
    }

    fn cursor(&self) -> i64 {
        self.as_dyn().cursor()
    }

    fn remaining_capacity(&self) -> i64 {
        self.as_dyn().remaining_capacity()
    }

    fn has_available_capacity(&self, n: i64) -> bool {
        self.as_dyn().has_available_capacity(n)
    }

    fn buffer_size(&self) -> usize {
        self.as_dyn().buffer_size()
    }
}
