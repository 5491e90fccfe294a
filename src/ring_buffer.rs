//! Slot storage, pre-allocation, and the producer/consumer publication
//! façade wrapping a [`crate::sequencer::SequencerHandle`].
//!
//! Grounded on the teacher's `RingBufferConfig` builder in
//! `disruptor/mod.rs` for the config surface, and on `disruptor/spsc/ring_buffer.rs`
//! for the claim/fill/publish call shape — generalized here to a
//! caller-supplied `EventFactory`/`EventTranslator` pair instead of a fixed
//! message-slot layout.

use std::any::TypeId;
use std::cell::UnsafeCell;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{DEFAULT_RING_BUFFER_SIZE, MAX_RING_BUFFER_SIZE};
use crate::error::{DisruptorError, Result};
use crate::sequence::Sequence;
use crate::sequence_barrier::SequenceBarrier;
use crate::sequencer::{MultiProducerSequencer, Sequencer, SequencerHandle, SingleProducerSequencer};
use crate::traits::{EventFactory, EventTranslator};
use crate::wait_strategy::{BlockingWaitStrategy, BusySpinWaitStrategy, SleepingWaitStrategy, WaitStrategy, YieldingWaitStrategy};

/// Which sequencer variant a [`RingBuffer`] is built on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProducerType {
    Single,
    Multi,
}

/// Which [`WaitStrategy`] a [`RingBuffer`] is built with.
#[derive(Clone, Debug)]
pub enum WaitStrategyKind {
    BusySpin,
    Blocking,
    Yielding,
    Sleeping(Duration),
}

impl WaitStrategyKind {
    fn build(&self) -> Arc<dyn WaitStrategy> {
        match self {
            WaitStrategyKind::BusySpin => Arc::new(BusySpinWaitStrategy::new()),
            WaitStrategyKind::Blocking => Arc::new(BlockingWaitStrategy::new()),
            WaitStrategyKind::Yielding => Arc::new(YieldingWaitStrategy::new()),
            WaitStrategyKind::Sleeping(d) => Arc::new(SleepingWaitStrategy::with_sleep_duration(*d)),
        }
    }
}

/// Builder for a [`RingBuffer`], mirroring the teacher's
/// `RingBufferConfig::new`/`with_*` idiom including its power-of-two and
/// non-zero validation.
#[derive(Clone, Debug)]
pub struct RingBufferConfig {
    buffer_size: usize,
    producer_type: ProducerType,
    wait_strategy: WaitStrategyKind,
}

impl RingBufferConfig {
    pub fn new(buffer_size: usize) -> Result<Self> {
        if buffer_size == 0 || !buffer_size.is_power_of_two() {
            return Err(DisruptorError::invalid_argument(
                "ring buffer size must be a positive power of two",
            ));
        }
        if buffer_size > MAX_RING_BUFFER_SIZE {
            return Err(DisruptorError::invalid_argument(format!(
                "ring buffer size {buffer_size} exceeds the maximum of {MAX_RING_BUFFER_SIZE}"
            )));
        }
        Ok(Self {
            buffer_size,
            producer_type: ProducerType::Single,
            wait_strategy: WaitStrategyKind::BusySpin,
        })
    }

    pub fn with_producer_type(mut self, producer_type: ProducerType) -> Self {
        self.producer_type = producer_type;
        self
    }

    pub fn with_wait_strategy(mut self, wait_strategy: WaitStrategyKind) -> Self {
        self.wait_strategy = wait_strategy;
        self
    }

    pub fn build<E: 'static>(self, factory: &dyn EventFactory<E>) -> Result<Arc<RingBuffer<E>>> {
        match self.producer_type {
            ProducerType::Single => RingBuffer::create_single_producer(factory, self.buffer_size, self.wait_strategy.build()),
            ProducerType::Multi => RingBuffer::create_multi_producer(factory, self.buffer_size, self.wait_strategy.build()),
        }
    }
}

impl Default for RingBufferConfig {
    /// A single-producer, busy-spin config at [`DEFAULT_RING_BUFFER_SIZE`],
    /// which is already validated power-of-two and within
    /// [`MAX_RING_BUFFER_SIZE`], so this never fails the way `new` can.
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_RING_BUFFER_SIZE,
            producer_type: ProducerType::Single,
            wait_strategy: WaitStrategyKind::BusySpin,
        }
    }
}

/// Fixed-size, pre-allocated event storage plus the publication protocol.
///
/// Slots are mutated only by the producer holding the claimed sequence,
/// between `next()`/`try_next()` and `publish()`; after publication a slot
/// is read-only until the sequence wraps (`buffer_size` sequences later),
/// at which point the next claimer becomes the slot's unique mutator.
pub struct RingBuffer<E> {
    entries: Box<[UnsafeCell<E>]>,
    index_mask: i64,
    sequencer: SequencerHandle,
    event_class: TypeId,
}

// SAFETY: access to `entries` is disciplined by sequence claims, never by
// shared mutable aliasing — see the slot-ownership contract on the struct.
unsafe impl<E: Send> Send for RingBuffer<E> {}
unsafe impl<E: Send> Sync for RingBuffer<E> {}

impl<E: 'static> RingBuffer<E> {
    /// Allocate `buffer_size` slots via `factory.new_instance()`, backed by
    /// a single-producer sequencer.
    pub fn create_single_producer(
        factory: &dyn EventFactory<E>,
        buffer_size: usize,
        wait_strategy: Arc<dyn WaitStrategy>,
    ) -> Result<Arc<Self>> {
        let sequencer = Arc::new(SingleProducerSequencer::new(buffer_size, wait_strategy)?);
        Ok(Self::from_sequencer(factory, buffer_size, SequencerHandle::Single(sequencer)))
    }

    /// Allocate `buffer_size` slots via `factory.new_instance()`, backed by
    /// a multi-producer sequencer.
    pub fn create_multi_producer(
        factory: &dyn EventFactory<E>,
        buffer_size: usize,
        wait_strategy: Arc<dyn WaitStrategy>,
    ) -> Result<Arc<Self>> {
        let sequencer = Arc::new(MultiProducerSequencer::new(buffer_size, wait_strategy)?);
        Ok(Self::from_sequencer(factory, buffer_size, SequencerHandle::Multi(sequencer)))
    }

    fn from_sequencer(factory: &dyn EventFactory<E>, buffer_size: usize, sequencer: SequencerHandle) -> Arc<Self> {
        let event_class = factory.event_class();
        let entries = (0..buffer_size)
            .map(|_| UnsafeCell::new(factory.new_instance()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Arc::new(Self {
            entries,
            index_mask: buffer_size as i64 - 1,
            sequencer,
            event_class,
        })
    }

    #[inline(always)]
    fn index(&self, sequence: i64) -> usize {
        (sequence & self.index_mask) as usize
    }

    /// Immutable access to the slot claimed for `sequence`. Valid for a
    /// producer mid-fill or a consumer that has observed `sequence` as
    /// published.
    #[inline(always)]
    pub fn get(&self, sequence: i64) -> &E {
        // SAFETY: the caller holds the claim (producer) or observed
        // publication (consumer) for `sequence`, per the slot-ownership
        // contract on `RingBuffer`.
        unsafe { &*self.entries[self.index(sequence)].get() }
    }

    /// Mutable access to the slot claimed for `sequence`. Only sound for the
    /// producer that currently holds the claim on `sequence` — i.e. between
    /// `next()`/`try_next()` returning it and the matching `publish()`.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub fn claim_and_get_preallocated(&self, sequence: i64) -> &mut E {
        // SAFETY: see above; claims never overlap for a correctly-used
        // sequencer, so this is the unique reference to the slot.
        unsafe { &mut *self.entries[self.index(sequence)].get() }
    }

    /// Claim `n` slots, blocking until free. Returns the highest claimed
    /// sequence.
    pub fn next(&self, n: i64) -> i64 {
        self.sequencer.next(n)
    }

    /// Non-blocking form of [`RingBuffer::next`].
    pub fn try_next(&self, n: i64) -> Result<i64> {
        self.sequencer.try_next(n)
    }

    /// Publish the inclusive range `[low, high]`.
    pub fn publish(&self, low: i64, high: i64) {
        self.sequencer.publish(low, high);
    }

    pub fn is_published(&self, sequence: i64) -> bool {
        self.sequencer.is_available(sequence)
    }

    pub fn add_gating_sequences(&self, sequences: &[Arc<Sequence>]) {
        self.sequencer.add_gating_sequences(sequences);
    }

    pub fn remove_gating_sequence(&self, sequence: &Arc<Sequence>) -> bool {
        self.sequencer.remove_gating_sequence(sequence)
    }

    pub fn new_barrier(&self, dependent_sequences: Vec<Arc<Sequence>>) -> SequenceBarrier {
        self.sequencer.new_barrier(dependent_sequences)
    }

    pub fn cursor(&self) -> i64 {
        self.sequencer.cursor()
    }

    pub fn buffer_size(&self) -> usize {
        self.sequencer.buffer_size()
    }

    pub fn has_available_capacity(&self, n: i64) -> bool {
        self.sequencer.has_available_capacity(n)
    }

    pub fn remaining_capacity(&self) -> i64 {
        self.sequencer.remaining_capacity()
    }

    /// Racy reset used during initialization or test setup: forces both the
    /// producer cursor and claim state to `sequence`.
    pub fn reset_to(&self, sequence: i64) {
        self.sequencer.claim(sequence);
    }

    /// Cursor handle suitable for use as a dependent sequence in a
    /// downstream barrier.
    pub fn cursor_handle(&self) -> Arc<Sequence> {
        self.sequencer.cursor_handle()
    }

    /// `Err(InvalidArgument)` if `translator` declares a different
    /// [`EventTranslator::event_class`] than this ring's
    /// [`EventFactory::event_class`] — checked before claiming a slot so a
    /// mismatched translator never consumes ring capacity.
    fn check_event_class<A>(&self, translator: &dyn EventTranslator<E, A>) -> Result<()> {
        if translator.event_class() != self.event_class {
            return Err(DisruptorError::invalid_argument(
                "translator's event_class does not match this ring buffer's event type",
            ));
        }
        Ok(())
    }

    /// Claim one slot, translate into it, and publish — even if translation
    /// fails, per the crate's exception-safe publication policy: the
    /// claimed sequence must never be left unpublished, so a translator
    /// failure still advances the ring and the failure is re-raised to the
    /// caller afterward.
    pub fn publish_event<A>(&self, translator: &dyn EventTranslator<E, A>, args: &A) -> Result<()> {
        self.check_event_class(translator)?;
        let sequence = self.next(1);
        self.translate_and_publish_one(translator, sequence, args)
    }

    /// Non-blocking form of [`RingBuffer::publish_event`].
    pub fn try_publish_event<A>(&self, translator: &dyn EventTranslator<E, A>, args: &A) -> Result<()> {
        self.check_event_class(translator)?;
        let sequence = self.try_next(1)?;
        self.translate_and_publish_one(translator, sequence, args)
    }

    fn translate_and_publish_one<A>(
        &self,
        translator: &dyn EventTranslator<E, A>,
        sequence: i64,
        args: &A,
    ) -> Result<()> {
        let result = translator.translate_to(self.claim_and_get_preallocated(sequence), sequence, args);
        self.publish(sequence, sequence);
        result
    }

    /// Claim a batch sized to `args`, translate each slot, and publish the
    /// whole range once. On a translator failure partway through, the
    /// claimed range is still published in full before re-raising, for the
    /// same reason as [`RingBuffer::publish_event`].
    pub fn publish_events<A>(&self, translator: &dyn EventTranslator<E, A>, args: &[A]) -> Result<()> {
        self.check_event_class(translator)?;
        let high = self.next(args.len() as i64);
        self.translate_and_publish_many(translator, high, args)
    }

    /// Non-blocking form of [`RingBuffer::publish_events`].
    pub fn try_publish_events<A>(&self, translator: &dyn EventTranslator<E, A>, args: &[A]) -> Result<()> {
        self.check_event_class(translator)?;
        let high = self.try_next(args.len() as i64)?;
        self.translate_and_publish_many(translator, high, args)
    }

    fn translate_and_publish_many<A>(
        &self,
        translator: &dyn EventTranslator<E, A>,
        high: i64,
        args: &[A],
    ) -> Result<()> {
        let low = high - args.len() as i64 + 1;
        let mut first_error = None;
        for (offset, arg) in args.iter().enumerate() {
            let sequence = low + offset as i64;
            if let Err(e) = translator.translate_to(self.claim_and_get_preallocated(sequence), sequence, arg) {
                first_error.get_or_insert(e);
            }
        }
        self.publish(low, high);
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
