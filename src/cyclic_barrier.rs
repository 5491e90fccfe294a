//! N-party rendezvous used to start a set of event processors together.
//!
//! Implemented from the abstract contract in the specification rather than
//! from any source's `doWait` control flow, per the Open Questions this
//! crate resolves explicitly (see `DESIGN.md`): the tripping arrival runs
//! the barrier action, advances the generation, and returns — no implicit
//! fallthrough into another wait.
//!
//! Style grounded on the teacher's `BlockingWaitStrategy`: a
//! `parking_lot::Mutex` guarding shared state plus a `Condvar` for
//! rendezvous, rather than a hand-rolled futex.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{DisruptorError, Result};

/// Identity of one rendezvous epoch. Waiters capture an `Arc` to the
/// generation they joined so they can tell a normal trip (the shared
/// `State::generation` pointer moves on to a fresh, unbroken instance) apart
/// from a break (this same instance's flag flips to `true`).
struct Generation {
    broken: AtomicBool,
}

impl Generation {
    fn fresh() -> Arc<Self> {
        Arc::new(Self {
            broken: AtomicBool::new(false),
        })
    }
}

struct State {
    generation: Arc<Generation>,
    count: usize,
}

/// An action run by the last arriver before the generation advances. Must
/// not itself call [`CyclicBarrier::await_parties`] — doing so would
/// deadlock against the barrier it is part of.
pub trait BarrierAction: Send + Sync {
    fn run(&self) -> Result<()>;
}

impl<F: Fn() -> Result<()> + Send + Sync> BarrierAction for F {
    fn run(&self) -> Result<()> {
        self()
    }
}

/// An N-party rendezvous barrier.
pub struct CyclicBarrier {
    parties: usize,
    mutex: parking_lot::Mutex<State>,
    condition: parking_lot::Condvar,
    action: Option<Arc<dyn BarrierAction>>,
}

impl CyclicBarrier {
    /// Create a barrier for `parties` participants with no trip action.
    pub fn new(parties: usize) -> Result<Self> {
        Self::with_action(parties, None)
    }

    /// Create a barrier for `parties` participants, running `action` on the
    /// last arrival before the generation advances.
    pub fn with_action(parties: usize, action: Option<Arc<dyn BarrierAction>>) -> Result<Self> {
        if parties == 0 {
            return Err(DisruptorError::invalid_argument(
                "cyclic barrier requires at least one party",
            ));
        }
        Ok(Self {
            parties,
            mutex: parking_lot::Mutex::new(State {
                generation: Generation::fresh(),
                count: parties,
            }),
            condition: parking_lot::Condvar::new(),
            action,
        })
    }

    /// Number of parties required to trip the barrier.
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Wait for every party to arrive at this generation.
    ///
    /// Returns the caller's arrival index: `parties - 1` for the first
    /// arrival, down to `0` for the party that trips the barrier.
    pub fn await_parties(&self) -> Result<usize> {
        self.do_wait(None)
    }

    /// As [`CyclicBarrier::await_parties`], but breaks the generation and
    /// returns [`DisruptorError::TimeoutExpired`] if `timeout` elapses
    /// before every party arrives.
    pub fn await_parties_timeout(&self, timeout: Duration) -> Result<usize> {
        self.do_wait(Some(timeout))
    }

    fn do_wait(&self, timeout: Option<Duration>) -> Result<usize> {
        let mut guard = self.mutex.lock();
        if guard.generation.broken.load(Ordering::Acquire) {
            return Err(DisruptorError::broken_barrier("generation already broken"));
        }

        let my_generation = guard.generation.clone();
        guard.count -= 1;
        let index = guard.count;

        if index == 0 {
            // Last arrival: run the action, then either start a fresh
            // generation (success) or mark this one broken (failure), and
            // wake everyone either way.
            let action_result = self.action.as_ref().map(|a| a.run());
            return match action_result {
                Some(Err(e)) => {
                    my_generation.broken.store(true, Ordering::Release);
                    self.condition.notify_all();
                    Err(DisruptorError::broken_barrier(e.to_string()))
                }
                _ => {
                    guard.generation = Generation::fresh();
                    guard.count = self.parties;
                    self.condition.notify_all();
                    Ok(0)
                }
            };
        }

        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if my_generation.broken.load(Ordering::Acquire) {
                return Err(DisruptorError::broken_barrier("a party broke the generation"));
            }
            // The shared pointer moving past the generation we joined means
            // the last arrival tripped it successfully.
            if !Arc::ptr_eq(&guard.generation, &my_generation) {
                return Ok(index);
            }

            match deadline {
                None => {
                    self.condition.wait(&mut guard);
                }
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        my_generation.broken.store(true, Ordering::Release);
                        self.condition.notify_all();
                        return Err(DisruptorError::TimeoutExpired);
                    }
                    self.condition.wait_for(&mut guard, remaining);
                }
            }
        }
    }

    /// Break the current generation and start a fresh one, releasing any
    /// waiting parties with a broken-barrier error.
    pub fn reset(&self) {
        let mut guard = self.mutex.lock();
        guard.generation.broken.store(true, Ordering::Release);
        guard.generation = Generation::fresh();
        guard.count = self.parties;
        self.condition.notify_all();
    }

    /// Number of parties still required to arrive at the current generation.
    pub fn number_waiting(&self) -> usize {
        self.parties - self.mutex.lock().count
    }
}
