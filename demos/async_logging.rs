//! Decoupling hot paths from slow sinks with the queue-backed handler.

use hierlog::{args, AsyncHandler, ConsoleHandler, Formatter, Handler, Registry, ALL, BASIC_FORMAT};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() -> hierlog::Result<()> {
    let registry = Registry::new();

    let console: Arc<dyn Handler> =
        Arc::new(ConsoleHandler::new().with_formatter(Formatter::new(BASIC_FORMAT)));
    let queued = Arc::new(AsyncHandler::with_capacity(console, 1024));
    registry.root().add_handler(queued.clone());

    let logger = registry.get_logger("pipeline");
    logger.set_level(ALL)?;

    let start = Instant::now();
    let mut last = None;
    for batch in 0..100 {
        // enqueue without waiting: the worker thread does the writing
        last = Some(logger.info(args!["batch %d enqueued", batch]));
    }
    println!("enqueued 100 records in {:?}", start.elapsed());

    // waiting on a completion confirms actual delivery through the queue
    if let Some(completion) = last {
        completion.wait()?;
    }

    // drain what is left before the process exits
    queued.shutdown(Duration::from_secs(5))?;
    Ok(())
}
