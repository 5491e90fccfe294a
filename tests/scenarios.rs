//! Cross-module coverage of the testable properties in the crate's design
//! notes (S1-S4); S5 and S6 are covered by `sequence_group.rs` and
//! `sequencer/single_producer.rs` unit tests respectively, closer to the
//! code they exercise.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gyre::prelude::*;
use parking_lot::Mutex;

fn char_factory() -> impl Fn() -> char {
    || 'E'
}

struct LifecycleHandler {
    log: Arc<Mutex<Vec<String>>>,
}

impl EventHandler<char> for LifecycleHandler {
    fn on_event(&self, event: &char, sequence: i64, end_of_batch: bool) -> Result<()> {
        self.log.lock().push(format!("{event}-{sequence}-{}", end_of_batch as u8));
        Ok(())
    }

    fn on_start(&self) -> Result<()> {
        self.log.lock().push("start".into());
        Ok(())
    }

    fn on_shutdown(&self) -> Result<()> {
        self.log.lock().push("shutdown".into());
        Ok(())
    }
}

struct NoopExceptionHandler;
impl ExceptionHandler<char> for NoopExceptionHandler {
    fn handle_event_exception(&self, _error: &DisruptorError, _sequence: i64, _event: &char) {}
    fn handle_on_start_exception(&self, _error: &DisruptorError) -> Result<()> {
        Ok(())
    }
    fn handle_on_shutdown_exception(&self, _error: &DisruptorError) -> Result<()> {
        Ok(())
    }
}

#[test]
fn s1_lifecycle_order_single_event() {
    let buffer =
        RingBuffer::create_multi_producer(&char_factory(), 16, Arc::new(BusySpinWaitStrategy::new())).unwrap();
    let barrier = buffer.new_barrier(Vec::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    let processor = Arc::new(BatchEventProcessor::new(
        buffer.clone(),
        barrier,
        Arc::new(LifecycleHandler { log: log.clone() }),
        Arc::new(NoopExceptionHandler),
    ));

    let runner = processor.clone();
    let handle = thread::spawn(move || runner.run());

    let seq = buffer.next(1);
    buffer.publish(seq, seq);

    thread::sleep(Duration::from_millis(20));
    processor.halt();
    handle.join().unwrap().unwrap();

    assert_eq!(*log.lock(), vec!["start", "E-0-1", "shutdown"]);
    assert_eq!(processor.get_sequence(), 0);
}

#[test]
fn s2_batch_grouping_before_processor_starts() {
    let buffer =
        RingBuffer::create_multi_producer(&char_factory(), 16, Arc::new(BusySpinWaitStrategy::new())).unwrap();

    let high = buffer.next(3);
    buffer.publish(0, high);

    let barrier = buffer.new_barrier(Vec::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    let processor = Arc::new(BatchEventProcessor::new(
        buffer.clone(),
        barrier,
        Arc::new(LifecycleHandler { log: log.clone() }),
        Arc::new(NoopExceptionHandler),
    ));

    let runner = processor.clone();
    let handle = thread::spawn(move || runner.run());

    thread::sleep(Duration::from_millis(20));
    processor.halt();
    handle.join().unwrap().unwrap();

    let entries = log.lock();
    assert_eq!(entries.as_slice(), ["start", "E-0-0", "E-1-0", "E-2-1", "shutdown"]);
}

struct FailOnFirstHandler {
    seen: Arc<Mutex<Vec<i64>>>,
}

impl EventHandler<char> for FailOnFirstHandler {
    fn on_event(&self, _event: &char, sequence: i64, _end_of_batch: bool) -> Result<()> {
        self.seen.lock().push(sequence);
        if sequence == 0 {
            return Err(DisruptorError::illegal_state("handler rejected sequence 0"));
        }
        Ok(())
    }
}

struct RecordingExceptionHandler {
    recorded: Arc<Mutex<Vec<i64>>>,
}

impl ExceptionHandler<char> for RecordingExceptionHandler {
    fn handle_event_exception(&self, _error: &DisruptorError, sequence: i64, _event: &char) {
        self.recorded.lock().push(sequence);
    }
    fn handle_on_start_exception(&self, _error: &DisruptorError) -> Result<()> {
        Ok(())
    }
    fn handle_on_shutdown_exception(&self, _error: &DisruptorError) -> Result<()> {
        Ok(())
    }
}

#[test]
fn s3_exception_path_still_advances() {
    let buffer =
        RingBuffer::create_multi_producer(&char_factory(), 16, Arc::new(BusySpinWaitStrategy::new())).unwrap();
    let barrier = buffer.new_barrier(Vec::new());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let processor = Arc::new(BatchEventProcessor::new(
        buffer.clone(),
        barrier,
        Arc::new(FailOnFirstHandler { seen: seen.clone() }),
        Arc::new(RecordingExceptionHandler { recorded: recorded.clone() }),
    ));

    let runner = processor.clone();
    let handle = thread::spawn(move || runner.run());

    let high = buffer.next(3);
    buffer.publish(0, high);

    thread::sleep(Duration::from_millis(20));
    processor.halt();
    handle.join().unwrap().unwrap();

    assert_eq!(*recorded.lock(), vec![0]);
    assert_eq!(*seen.lock(), vec![0, 1, 2]);
    assert_eq!(processor.get_sequence(), 2);
}

struct CountingWorker {
    seen: Arc<Mutex<Vec<i64>>>,
}

impl WorkHandler<u64> for CountingWorker {
    fn on_event(&self, _event: &u64, sequence: i64) -> Result<()> {
        self.seen.lock().push(sequence);
        Ok(())
    }
}

struct NoopWorkExceptionHandler;
impl ExceptionHandler<u64> for NoopWorkExceptionHandler {
    fn handle_event_exception(&self, _error: &DisruptorError, _sequence: i64, _event: &u64) {}
    fn handle_on_start_exception(&self, _error: &DisruptorError) -> Result<()> {
        Ok(())
    }
    fn handle_on_shutdown_exception(&self, _error: &DisruptorError) -> Result<()> {
        Ok(())
    }
}

#[test]
fn s4_worker_pool_partitions_every_sequence_exactly_once() {
    let buffer =
        RingBuffer::create_multi_producer(&(|| 0u64), 16, Arc::new(BusySpinWaitStrategy::new())).unwrap();

    let seen_lists: Vec<Arc<Mutex<Vec<i64>>>> = (0..3).map(|_| Arc::new(Mutex::new(Vec::new()))).collect();
    let handlers: Vec<Arc<dyn WorkHandler<u64>>> = seen_lists
        .iter()
        .map(|seen| Arc::new(CountingWorker { seen: seen.clone() }) as Arc<dyn WorkHandler<u64>>)
        .collect();

    let pool = Arc::new(WorkerPool::new(buffer.clone(), handlers, Arc::new(NoopWorkExceptionHandler)));
    let executor = ThreadExecutor::new();
    pool.start(&executor).unwrap();

    let high_water = Arc::new(AtomicI64::new(-1));
    for i in 0..100u64 {
        let seq = buffer.next(1);
        *buffer.claim_and_get_preallocated(seq) = i;
        buffer.publish(seq, seq);
        high_water.store(seq, Ordering::Relaxed);
    }

    pool.drain_and_halt();

    let mut all_seen: Vec<i64> = seen_lists.iter().flat_map(|l| l.lock().clone()).collect();
    all_seen.sort_unstable();
    assert_eq!(all_seen, (0..100).collect::<Vec<i64>>());
    assert_eq!(high_water.load(Ordering::Relaxed), 99);
}
