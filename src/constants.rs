//! gyre performance constants
//!
//! Core constants used by the sequencer and ring buffer implementations.

/// Default ring buffer size (must be power of 2)
pub const DEFAULT_RING_BUFFER_SIZE: usize = 1024 * 1024; // 1M slots

/// Maximum ring buffer size
pub const MAX_RING_BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4M slots

/// Cache line size for alignment (64 bytes on most CPUs)
pub const CACHE_LINE_SIZE: usize = 64;

/// Sentinel value for a sequence that has not yet claimed or published
/// anything.
pub const INITIAL_CURSOR_VALUE: i64 = -1;

/// Spin budget before a yielding wait strategy falls back to `thread::yield_now`
pub const YIELD_SPIN_TRIES: usize = 100;
