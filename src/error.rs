//! Error types and handling for the gyre library

use thiserror::Error;

/// Result type alias for gyre operations
pub type Result<T> = std::result::Result<T, DisruptorError>;

/// Main error type for the gyre library
#[derive(Error, Debug)]
pub enum DisruptorError {
    /// `try_next` could not satisfy the requested count without violating a
    /// gating sequence.
    #[error("insufficient capacity to claim the requested sequence range")]
    InsufficientCapacity,

    /// Non-power-of-two buffer size, non-positive parties, mismatched event
    /// class, negative batch sizing, or batch exceeding buffer size.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument
        message: String,
    },

    /// A wait strategy or cyclic barrier timed out.
    #[error("operation timed out")]
    TimeoutExpired,

    /// A cyclic barrier generation was broken by a timeout or a failing
    /// trip action.
    #[error("barrier generation broken: {reason}")]
    BrokenBarrier {
        /// Why the generation broke
        reason: String,
    },

    /// A processor was asked to halt. Control-flow only; never surfaced to
    /// user event/work handlers.
    #[error("processor alerted")]
    Alert,

    /// Double-start of a processor or pool, or a sequencer state
    /// inconsistency.
    #[error("illegal state: {message}")]
    IllegalState {
        /// Description of the illegal state
        message: String,
    },

    /// CPU affinity / system resource errors surfaced from `cpu::pin_to_cpu`.
    #[error("system resource error: {message}")]
    SystemResource {
        /// Description of the resource failure
        message: String,
    },
}

impl DisruptorError {
    /// Create a new invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new illegal-state error
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// Create a new broken-barrier error
    pub fn broken_barrier(reason: impl Into<String>) -> Self {
        Self::BrokenBarrier {
            reason: reason.into(),
        }
    }

    /// Create a new system-resource error
    pub fn system_resource(message: impl Into<String>) -> Self {
        Self::SystemResource {
            message: message.into(),
        }
    }

    /// Whether a caller might reasonably retry after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientCapacity | Self::TimeoutExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DisruptorError::invalid_argument("size must be a power of two");
        assert!(matches!(err, DisruptorError::InvalidArgument { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_classification() {
        assert!(DisruptorError::InsufficientCapacity.is_recoverable());
        assert!(DisruptorError::TimeoutExpired.is_recoverable());
        assert!(!DisruptorError::illegal_state("double start").is_recoverable());
        assert!(!DisruptorError::broken_barrier("timeout").is_recoverable());
    }
}
