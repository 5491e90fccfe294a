//! Minimal [`Executor`] that spawns one OS thread per submitted runnable,
//! optionally pinned to a CPU via [`crate::cpu::pin_to_cpu`].
//!
//! This is the concrete executor [`crate::processor::WorkerPool`] and the
//! crate's examples use so the library is runnable without every caller
//! writing their own thread-spawning glue, the same role the upstream
//! Disruptor's `BasicExecutor` plays.

use std::thread;

use crate::cpu;
use crate::traits::Executor;

/// Spawns a new OS thread per `execute` call. If CPU ids were supplied via
/// [`ThreadExecutor::with_cpu_pins`], threads are handed out pins
/// round-robin as they are submitted.
pub struct ThreadExecutor {
    cpu_pins: Vec<usize>,
    next_pin: std::sync::atomic::AtomicUsize,
}

impl ThreadExecutor {
    /// An executor that does not pin any thread to a CPU.
    pub fn new() -> Self {
        Self {
            cpu_pins: Vec::new(),
            next_pin: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// An executor that pins each spawned thread to one of `cpu_ids`,
    /// assigned round-robin as threads are submitted.
    pub fn with_cpu_pins(cpu_ids: Vec<usize>) -> Self {
        Self {
            cpu_pins: cpu_ids,
            next_pin: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ThreadExecutor {
    fn execute(&self, runnable: Box<dyn FnOnce() + Send>) {
        let pin = if self.cpu_pins.is_empty() {
            None
        } else {
            let idx = self
                .next_pin
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
                % self.cpu_pins.len();
            Some(self.cpu_pins[idx])
        };

        thread::spawn(move || {
            if let Some(cpu_id) = pin {
                if let Err(error) = cpu::pin_to_cpu(cpu_id) {
                    tracing::warn!(cpu_id, %error, "failed to pin processor thread, continuing unpinned");
                }
            }
            runnable();
        });
    }
}
