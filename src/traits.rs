//! Narrow capability interfaces a caller plugs in: how slots are built, how
//! data gets into them, how published events get handled, and how failures
//! and threads are dealt with. This crate owns the ring buffer and the
//! concurrency core; it never owns the payload type or its handlers.

use std::any::TypeId;

use crate::error::Result;

/// Builds the `N` pre-allocated slot payloads at ring construction time.
pub trait EventFactory<E: 'static>: Send + Sync {
    fn new_instance(&self) -> E;

    /// Identity of the event type this factory produces. A [`RingBuffer`]
    /// captures this once at construction and checks every
    /// [`EventTranslator::event_class`] against it before claiming a slot,
    /// so a translator built for the wrong ring is rejected up front rather
    /// than silently writing through a mismatched view of the slot.
    ///
    /// [`RingBuffer`]: crate::ring_buffer::RingBuffer
    fn event_class(&self) -> TypeId {
        TypeId::of::<E>()
    }
}

impl<E: 'static, F: Fn() -> E + Send + Sync> EventFactory<E> for F {
    fn new_instance(&self) -> E {
        self()
    }
}

/// Writes caller-supplied data into a pre-allocated slot. The only
/// mechanism by which data enters the ring.
pub trait EventTranslator<E: 'static, A>: Send + Sync {
    fn translate_to(&self, event: &mut E, sequence: i64, args: &A) -> Result<()>;

    /// See [`EventFactory::event_class`]. Defaults to the translator's
    /// declared event type, which is what every closure-based translator
    /// gets for free; override only to deliberately declare a mismatch.
    fn event_class(&self) -> TypeId {
        TypeId::of::<E>()
    }
}

impl<E: 'static, A, F: Fn(&mut E, i64, &A) -> Result<()> + Send + Sync> EventTranslator<E, A> for F {
    fn translate_to(&self, event: &mut E, sequence: i64, args: &A) -> Result<()> {
        self(event, sequence, args)
    }
}

/// Exclusive consumer of published events, driven by a
/// [`crate::processor::BatchEventProcessor`].
pub trait EventHandler<E>: Send + Sync {
    fn on_event(&self, event: &E, sequence: i64, end_of_batch: bool) -> Result<()>;

    /// Called once before the processor's run loop starts consuming.
    fn on_start(&self) -> Result<()> {
        Ok(())
    }

    /// Called once after the processor's run loop exits.
    fn on_shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Competitive consumer of published events, driven by a
/// [`crate::processor::WorkProcessor`]. No batch flag: each delivery is one
/// event claimed by exactly one worker.
pub trait WorkHandler<E>: Send + Sync {
    fn on_event(&self, event: &E, sequence: i64) -> Result<()>;
}

/// Routes failures that occur inside a processor's run loop. The default
/// implementation ([`crate::exception_handler::LoggingExceptionHandler`])
/// logs and re-raises at start/shutdown, but swallows at event time so one
/// bad event doesn't stall the pipeline.
pub trait ExceptionHandler<E>: Send + Sync {
    fn handle_event_exception(&self, error: &crate::error::DisruptorError, sequence: i64, event: &E);
    fn handle_on_start_exception(&self, error: &crate::error::DisruptorError) -> Result<()>;
    fn handle_on_shutdown_exception(&self, error: &crate::error::DisruptorError) -> Result<()>;
}

/// Minimal execution interface a [`crate::processor::WorkerPool`] or a
/// caller-driven [`crate::processor::BatchEventProcessor`] uses to run a
/// processor's loop on its own thread.
pub trait Executor: Send + Sync {
    fn execute(&self, runnable: Box<dyn FnOnce() + Send>);
}
