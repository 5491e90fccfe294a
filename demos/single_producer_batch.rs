//! Single producer publishing batches of trade ticks to one
//! [`BatchEventProcessor`], shut down once every tick has drained.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gyre::prelude::*;

#[derive(Debug, Default, Clone, Copy)]
struct Tick {
    price: u64,
    sequence: i64,
}

struct PrintingHandler {
    count: AtomicU64,
}

impl EventHandler<Tick> for PrintingHandler {
    fn on_event(&self, event: &Tick, sequence: i64, end_of_batch: bool) -> Result<()> {
        self.count.fetch_add(1, Ordering::Relaxed);
        if end_of_batch {
            println!("batch ended at sequence {sequence} (last price {})", event.price);
        }
        Ok(())
    }

    fn on_start(&self) -> Result<()> {
        println!("processor starting");
        Ok(())
    }

    fn on_shutdown(&self) -> Result<()> {
        println!("processor stopped after {} ticks", self.count.load(Ordering::Relaxed));
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let buffer = RingBufferConfig::new(1024)?
        .with_producer_type(ProducerType::Single)
        .with_wait_strategy(WaitStrategyKind::Yielding)
        .build::<Tick>(&Tick::default)?;

    let barrier = buffer.new_barrier(Vec::new());
    let processor = Arc::new(BatchEventProcessor::new(
        buffer.clone(),
        barrier,
        Arc::new(PrintingHandler { count: AtomicU64::new(0) }),
        Arc::new(LoggingExceptionHandler::<Tick>::new()),
    ));
    buffer.add_gating_sequences(&[processor.sequence_handle()]);

    let runner = processor.clone();
    let handle = thread::spawn(move || runner.run());

    let translator = |event: &mut Tick, sequence: i64, price: &u64| {
        event.price = *price;
        event.sequence = sequence;
        Ok(())
    };
    for batch in 0..10u64 {
        let prices: Vec<u64> = (0..20).map(|i| batch * 1000 + i).collect();
        buffer.publish_events(&translator, &prices)?;
        thread::sleep(Duration::from_millis(5));
    }

    thread::sleep(Duration::from_millis(50));
    processor.halt();
    handle.join().expect("processor thread panicked")?;
    Ok(())
}
