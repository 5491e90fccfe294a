//! Default [`ExceptionHandler`] implementation.
//!
//! Named after the Java Disruptor's `FatalExceptionHandler`/
//! `IgnoreExceptionHandler` split, collapsed into one type configurable by
//! `swallow_event_exceptions` since the propagation policy (swallow at
//! event time, re-raise at lifecycle boundaries) is fixed by this crate's
//! contract rather than something most callers need to vary per-kind.

use std::fmt::Debug;
use std::marker::PhantomData;

use crate::error::{DisruptorError, Result};
use crate::traits::ExceptionHandler;

/// Logs every exception via `tracing`, then follows the default propagation
/// policy: swallow at event time (so one bad event doesn't stall the
/// pipeline), re-raise at `on_start`/`on_shutdown`.
pub struct LoggingExceptionHandler<E> {
    _marker: PhantomData<fn(&E)>,
}

impl<E> LoggingExceptionHandler<E> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for LoggingExceptionHandler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Debug> ExceptionHandler<E> for LoggingExceptionHandler<E> {
    fn handle_event_exception(&self, error: &DisruptorError, sequence: i64, event: &E) {
        tracing::error!(sequence, ?event, %error, "event handler raised; swallowing and advancing");
    }

    fn handle_on_start_exception(&self, error: &DisruptorError) -> Result<()> {
        tracing::error!(%error, "on_start raised; halting processor");
        Err(DisruptorError::illegal_state(format!(
            "on_start failed: {error}"
        )))
    }

    fn handle_on_shutdown_exception(&self, error: &DisruptorError) -> Result<()> {
        tracing::error!(%error, "on_shutdown raised");
        Err(DisruptorError::illegal_state(format!(
            "on_shutdown failed: {error}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_exception_is_swallowed() {
        let handler: LoggingExceptionHandler<i32> = LoggingExceptionHandler::new();
        // Must not panic; there is nothing to assert on besides "it returns".
        handler.handle_event_exception(&DisruptorError::Alert, 3, &42);
    }

    #[test]
    fn test_start_exception_is_reraised() {
        let handler: LoggingExceptionHandler<i32> = LoggingExceptionHandler::new();
        let result = handler.handle_on_start_exception(&DisruptorError::TimeoutExpired);
        assert!(result.is_err());
    }

    #[test]
    fn test_shutdown_exception_is_reraised() {
        let handler: LoggingExceptionHandler<i32> = LoggingExceptionHandler::new();
        let result = handler.handle_on_shutdown_exception(&DisruptorError::TimeoutExpired);
        assert!(result.is_err());
    }
}
