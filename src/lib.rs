//! gyre: a Disruptor-style concurrent event exchange.
//!
//! A bounded, pre-allocated ring buffer is the sole synchronization point
//! between one or more producers and one or more consumers, coordinated
//! through monotonically increasing sequence counters and a pluggable wait
//! strategy. See [`ring_buffer::RingBuffer`] for the main entry point and
//! [`processor`] for the two consumption models (exclusive batch
//! processing, competitive work-stealing).

pub mod constants;
pub mod cpu;
pub mod cyclic_barrier;
pub mod error;
pub mod exception_handler;
pub mod executor;
pub mod processor;
pub mod ring_buffer;
pub mod sequence;
pub mod sequence_barrier;
pub mod sequence_group;
pub mod sequencer;
pub mod traits;
pub mod wait_strategy;

pub use cyclic_barrier::CyclicBarrier;
pub use error::{DisruptorError, Result};
pub use exception_handler::LoggingExceptionHandler;
pub use executor::ThreadExecutor;
pub use processor::{BatchEventProcessor, WorkProcessor, WorkerPool};
pub use ring_buffer::{ProducerType, RingBuffer, RingBufferConfig, WaitStrategyKind};
pub use sequence::Sequence;
pub use sequence_barrier::SequenceBarrier;
pub use sequence_group::SequenceGroup;
pub use sequencer::{MultiProducerSequencer, Sequencer, SequencerHandle, SingleProducerSequencer};
pub use traits::{EventFactory, EventHandler, EventTranslator, ExceptionHandler, Executor, WorkHandler};
pub use wait_strategy::{
    Alertable, BlockingWaitStrategy, BusySpinWaitStrategy, SleepingWaitStrategy, TimeoutWaitStrategy,
    WaitStrategy, YieldingWaitStrategy,
};

/// Re-exports everything needed to wire up a ring buffer, sequencer, and
/// processors without enumerating every module.
pub mod prelude {
    pub use crate::{
        BatchEventProcessor, BlockingWaitStrategy, BusySpinWaitStrategy, CyclicBarrier, DisruptorError,
        EventFactory, EventHandler, EventTranslator, ExceptionHandler, Executor, LoggingExceptionHandler, ProducerType, Result,
        RingBuffer, RingBufferConfig, Sequence, SequenceBarrier, SequenceGroup, Sequencer, SequencerHandle,
        SleepingWaitStrategy, ThreadExecutor, WaitStrategy, WaitStrategyKind, WorkHandler, WorkProcessor,
        WorkerPool, YieldingWaitStrategy,
    };
}
