//! The padded atomic counter every producer cursor, consumer position, and
//! gating entry is built from.
//!
//! Grounded on the teacher's `PaddedProducerSequence`/`PaddedConsumerSequence`
//! split in `disruptor/common.rs`: both were a cache-line-padded `AtomicU64`.
//! Here there is exactly one role (`Sequence`), since producer cursors,
//! consumer positions, and gating entries are all the same concurrency
//! primitive in the Disruptor pattern — only their owner differs.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::constants::{CACHE_LINE_SIZE, INITIAL_CURSOR_VALUE};

/// Padding needed to round a `value: AtomicI64` field out to two cache
/// lines. `#[repr(align(128))]` below needs a literal, so this constant
/// exists to keep that literal honest against [`CACHE_LINE_SIZE`] — the
/// assertion just below fails to compile if the two ever drift apart.
const PADDING_BYTES: usize = 2 * CACHE_LINE_SIZE - std::mem::size_of::<AtomicI64>();
const _: () = assert!(2 * CACHE_LINE_SIZE == 128, "Sequence's repr(align(128)) must track CACHE_LINE_SIZE");

/// Cache-line padded 64-bit sequence counter.
///
/// False sharing is a performance issue that occurs when multiple threads
/// access different variables that happen to share a cache line. Padding the
/// counter to a full 128-byte span isolates it from whatever sits before and
/// after it in memory, which matters here because sequences are frequently
/// grouped into arrays (`SequenceGroup`) and structs (`SequenceBarrier`,
/// `BatchEventProcessor`) where a neighbor could otherwise be a hot,
/// independently-written field.
#[repr(align(128))]
pub struct Sequence {
    value: AtomicI64,
    _padding: [u8; PADDING_BYTES],
}

impl Sequence {
    /// Sentinel meaning "no events yet".
    pub const INITIAL_VALUE: i64 = INITIAL_CURSOR_VALUE;

    /// Create a sequence starting at [`Sequence::INITIAL_VALUE`].
    pub fn new() -> Self {
        Self::with_initial_value(Self::INITIAL_VALUE)
    }

    /// Create a sequence starting at an arbitrary value.
    pub fn with_initial_value(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
            _padding: [0; PADDING_BYTES],
        }
    }

    /// Acquire load.
    #[inline(always)]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    /// Release store.
    #[inline(always)]
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Release);
    }

    /// Relaxed store, for producer-local bookkeeping that does not need to be
    /// observed by other threads (e.g. `claim`-style resets during setup).
    #[inline(always)]
    pub fn set_relaxed(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Sequentially consistent compare-and-set. Returns `true` on success.
    #[inline(always)]
    pub fn compare_and_set(&self, expected: i64, new: i64) -> bool {
        self.value
            .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Atomically increment by one and return the new value.
    #[inline(always)]
    pub fn increment_and_get(&self) -> i64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Atomically add `delta` and return the new value.
    #[inline(always)]
    pub fn add_and_get(&self, delta: i64) -> i64 {
        self.value.fetch_add(delta, Ordering::SeqCst) + delta
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence").field("value", &self.get()).finish()
    }
}
