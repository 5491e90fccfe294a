//! Wait strategies for ring buffer consumers.
//!
//! Each strategy controls how a consumer waits for the producer cursor (and
//! any dependent consumers) to advance past a target sequence. They trade
//! latency against CPU usage; which one fits depends on whether spare cores
//! are available to dedicate to spinning.
//!
//! Grounded on the teacher's `disruptor/wait_strategy.rs`: the same four
//! strategies (busy-spin, blocking, sleeping, yielding), the same
//! `parking_lot::Mutex`/`Condvar` pairing for the blocking strategy, and the
//! same phased spin/yield/sleep structure for the yielding strategy. The
//! teacher's version checked a shutdown `AtomicBool` and returned a
//! placeholder sequence; this one actually polls the cursor and dependent
//! group against the target, and surfaces `Alert` when the barrier asks the
//! consumer to stop.

use std::thread;
use std::time::{Duration, Instant};

use crate::constants::YIELD_SPIN_TRIES;
use crate::error::{DisruptorError, Result};
use crate::sequence::Sequence;
use crate::sequence_group::SequenceGroup;

/// An alertable handle a wait strategy polls to know when to stop waiting
/// and surface [`DisruptorError::Alert`] instead.
pub trait Alertable {
    fn is_alerted(&self) -> bool;
}

/// Determines how a consumer waits for a target sequence to become
/// available.
pub trait WaitStrategy: Send + Sync {
    /// Block (by whatever means this strategy implements) until `cursor`
    /// has advanced to at least `target` and every sequence in `dependent`
    /// has too, or until `alertable` signals a halt request.
    ///
    /// Returns the minimum of `cursor` and `dependent`'s sequences observed
    /// at the moment progress became sufficient — the barrier then
    /// reconciles this against the sequencer's availability tracking.
    fn wait_for(
        &self,
        target: i64,
        cursor: &Sequence,
        dependent: &SequenceGroup,
        alertable: &dyn Alertable,
    ) -> Result<i64>;

    /// Wake any thread parked inside [`WaitStrategy::wait_for`]. Producers
    /// call this after every `publish`; processors call it after `alert()`.
    fn signal_all_when_blocking(&self);
}

#[inline(always)]
fn observe(target: i64, cursor: &Sequence, dependent: &SequenceGroup) -> Option<i64> {
    let available_cursor = cursor.get();
    if available_cursor < target {
        return None;
    }
    let available_dependent = dependent.get();
    if available_dependent < target {
        return None;
    }
    Some(available_cursor.min(available_dependent))
}

/// Busy-spin: tight load loop on the cursor. Lowest latency, consumes an
/// entire CPU core.
pub struct BusySpinWaitStrategy;

impl BusySpinWaitStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BusySpinWaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for BusySpinWaitStrategy {
    fn wait_for(
        &self,
        target: i64,
        cursor: &Sequence,
        dependent: &SequenceGroup,
        alertable: &dyn Alertable,
    ) -> Result<i64> {
        loop {
            if alertable.is_alerted() {
                return Err(DisruptorError::Alert);
            }
            if let Some(available) = observe(target, cursor, dependent) {
                return Ok(available);
            }
            std::hint::spin_loop();
        }
    }

    fn signal_all_when_blocking(&self) {
        // No-op: there are no parked threads to wake.
    }
}

/// Blocking: parks on a condition variable, woken by
/// [`WaitStrategy::signal_all_when_blocking`] after every publish.
/// Balanced latency and CPU usage; the default choice for most workloads.
pub struct BlockingWaitStrategy {
    mutex: parking_lot::Mutex<()>,
    condition: parking_lot::Condvar,
}

impl BlockingWaitStrategy {
    pub fn new() -> Self {
        Self {
            mutex: parking_lot::Mutex::new(()),
            condition: parking_lot::Condvar::new(),
        }
    }
}

impl Default for BlockingWaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for BlockingWaitStrategy {
    fn wait_for(
        &self,
        target: i64,
        cursor: &Sequence,
        dependent: &SequenceGroup,
        alertable: &dyn Alertable,
    ) -> Result<i64> {
        if let Some(available) = observe(target, cursor, dependent) {
            return Ok(available);
        }

        let park_timeout = Duration::from_micros(100);
        loop {
            if alertable.is_alerted() {
                return Err(DisruptorError::Alert);
            }
            if let Some(available) = observe(target, cursor, dependent) {
                return Ok(available);
            }

            let mut guard = self.mutex.lock();
            // Re-check under the lock: the publishing producer may have
            // signalled between our lock-free check above and acquiring the
            // mutex, in which case `notify_all` already happened and we'd
            // park forever without this.
            if observe(target, cursor, dependent).is_some() || alertable.is_alerted() {
                continue;
            }
            self.condition.wait_for(&mut guard, park_timeout);
        }
    }

    fn signal_all_when_blocking(&self) {
        self.condition.notify_all();
    }
}

/// Sleeping: spins briefly, then yields, then parks the thread for a fixed
/// duration between checks. Lowest CPU usage, highest latency.
pub struct SleepingWaitStrategy {
    spin_tries: usize,
    sleep_duration: Duration,
}

impl SleepingWaitStrategy {
    pub fn new() -> Self {
        Self::with_sleep_duration(Duration::from_millis(1))
    }

    pub fn with_sleep_duration(sleep_duration: Duration) -> Self {
        Self {
            spin_tries: 100,
            sleep_duration,
        }
    }
}

impl Default for SleepingWaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for SleepingWaitStrategy {
    fn wait_for(
        &self,
        target: i64,
        cursor: &Sequence,
        dependent: &SequenceGroup,
        alertable: &dyn Alertable,
    ) -> Result<i64> {
        let mut counter = 0usize;
        loop {
            if alertable.is_alerted() {
                return Err(DisruptorError::Alert);
            }
            if let Some(available) = observe(target, cursor, dependent) {
                return Ok(available);
            }

            if counter < self.spin_tries {
                std::hint::spin_loop();
            } else if counter < self.spin_tries + 10 {
                thread::yield_now();
            } else {
                thread::sleep(self.sleep_duration);
            }
            counter += 1;
        }
    }

    fn signal_all_when_blocking(&self) {
        // No-op: sleeping threads wake up on their own on the next poll.
    }
}

/// Yielding: spins for a short budget, then yields the OS thread. A
/// compromise between busy-spin and sleeping.
pub struct YieldingWaitStrategy {
    spin_tries: usize,
}

impl YieldingWaitStrategy {
    pub fn new() -> Self {
        Self {
            spin_tries: YIELD_SPIN_TRIES,
        }
    }

    pub fn with_spin_tries(spin_tries: usize) -> Self {
        Self { spin_tries }
    }
}

impl Default for YieldingWaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for YieldingWaitStrategy {
    fn wait_for(
        &self,
        target: i64,
        cursor: &Sequence,
        dependent: &SequenceGroup,
        alertable: &dyn Alertable,
    ) -> Result<i64> {
        let mut counter = 0usize;
        loop {
            if alertable.is_alerted() {
                return Err(DisruptorError::Alert);
            }
            if let Some(available) = observe(target, cursor, dependent) {
                return Ok(available);
            }

            if counter < self.spin_tries {
                std::hint::spin_loop();
            } else {
                thread::yield_now();
            }
            counter += 1;
        }
    }

    fn signal_all_when_blocking(&self) {
        // No-op: yielding threads re-poll on their own schedule.
    }
}

/// Wraps another strategy with a hard deadline, returning
/// [`DisruptorError::TimeoutExpired`] if progress doesn't arrive in time.
pub struct TimeoutWaitStrategy {
    timeout: Duration,
    inner: Box<dyn WaitStrategy>,
    poll_interval: Duration,
}

impl TimeoutWaitStrategy {
    pub fn new(timeout: Duration, inner: Box<dyn WaitStrategy>) -> Self {
        Self {
            timeout,
            inner,
            poll_interval: Duration::from_micros(50),
        }
    }
}

impl WaitStrategy for TimeoutWaitStrategy {
    fn wait_for(
        &self,
        target: i64,
        cursor: &Sequence,
        dependent: &SequenceGroup,
        alertable: &dyn Alertable,
    ) -> Result<i64> {
        let start = Instant::now();
        loop {
            if alertable.is_alerted() {
                return Err(DisruptorError::Alert);
            }
            if let Some(available) = observe(target, cursor, dependent) {
                return Ok(available);
            }
            if start.elapsed() > self.timeout {
                return Err(DisruptorError::TimeoutExpired);
            }
            // Poll in short bursts rather than delegating to `inner` (which
            // has no notion of a deadline) so the overall timeout is honored.
            thread::sleep(self.poll_interval.min(self.timeout));
        }
    }

    fn signal_all_when_blocking(&self) {
        self.inner.signal_all_when_blocking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct TestAlert(AtomicBool);
    impl Alertable for TestAlert {
        fn is_alerted(&self) -> bool {
            self.0.load(Ordering::Acquire)
        }
    }

    #[test]
    fn test_busy_spin_returns_once_cursor_catches_up() {
        let strategy = BusySpinWaitStrategy::new();
        let cursor = Sequence::with_initial_value(5);
        let dependent = SequenceGroup::new();
        let alert = TestAlert(AtomicBool::new(false));

        let result = strategy.wait_for(5, &cursor, &dependent, &alert);
        assert_eq!(result.unwrap(), 5);
    }

    #[test]
    fn test_busy_spin_surfaces_alert() {
        let strategy = BusySpinWaitStrategy::new();
        let cursor = Sequence::new();
        let dependent = SequenceGroup::new();
        let alert = TestAlert(AtomicBool::new(true));

        let result = strategy.wait_for(0, &cursor, &dependent, &alert);
        assert!(matches!(result, Err(DisruptorError::Alert)));
    }

    #[test]
    fn test_blocking_wait_strategy_wakes_on_signal() {
        let strategy = Arc::new(BlockingWaitStrategy::new());
        let cursor = Arc::new(Sequence::with_initial_value(-1));
        let dependent = Arc::new(SequenceGroup::new());
        let alert = Arc::new(TestAlert(AtomicBool::new(false)));

        let s = strategy.clone();
        let c = cursor.clone();
        let a = alert.clone();
        let handle = thread::spawn(move || s.wait_for(0, &c, &SequenceGroup::new(), a.as_ref()));

        thread::sleep(Duration::from_millis(5));
        cursor.set(0);
        strategy.signal_all_when_blocking();

        let result = handle.join().unwrap();
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_dependent_group_gates_progress() {
        let strategy = BusySpinWaitStrategy::new();
        let cursor = Sequence::with_initial_value(10);
        let dependent = SequenceGroup::new();
        let slow = Arc::new(Sequence::with_initial_value(2));
        dependent.add(slow.clone());
        let alert = TestAlert(AtomicBool::new(false));

        slow.set(10);
        let result = strategy.wait_for(5, &cursor, &dependent, &alert);
        assert_eq!(result.unwrap(), 10);
    }

    #[test]
    fn test_yielding_wait_strategy() {
        let strategy = YieldingWaitStrategy::with_spin_tries(2);
        let cursor = Sequence::with_initial_value(0);
        let dependent = SequenceGroup::new();
        let alert = TestAlert(AtomicBool::new(false));

        assert_eq!(strategy.wait_for(0, &cursor, &dependent, &alert).unwrap(), 0);
    }

    #[test]
    fn test_sleeping_wait_strategy() {
        let strategy = SleepingWaitStrategy::with_sleep_duration(Duration::from_micros(1));
        let cursor = Sequence::with_initial_value(0);
        let dependent = SequenceGroup::new();
        let alert = TestAlert(AtomicBool::new(false));

        assert_eq!(strategy.wait_for(0, &cursor, &dependent, &alert).unwrap(), 0);
    }

    #[test]
    fn test_timeout_wait_strategy_expires() {
        let inner = Box::new(SleepingWaitStrategy::with_sleep_duration(Duration::from_millis(50)));
        let strategy = TimeoutWaitStrategy::new(Duration::from_millis(5), inner);
        let cursor = Sequence::new();
        let dependent = SequenceGroup::new();
        let alert = TestAlert(AtomicBool::new(false));

        let result = strategy.wait_for(0, &cursor, &dependent, &alert);
        assert!(matches!(result, Err(DisruptorError::TimeoutExpired)));
    }
}
