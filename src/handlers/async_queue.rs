//! Queue-backed handler decoupling callers from slow sinks

use crate::core::completion::{Completion, CompletionSender};
use crate::core::error::{LogError, Result};
use crate::core::handler::{Handler, HandlerCore};
use crate::core::record::Record;
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const DEFAULT_QUEUE_CAPACITY: usize = 8192;
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

type Job = (Arc<Record>, CompletionSender);

/// Hands records to a wrapped handler on a dedicated worker thread.
///
/// The caller's completion resolves with the wrapped handler's outcome once
/// the worker has processed the record, so waiting on it still gives true
/// delivery confirmation. The queue is bounded; a full queue applies
/// backpressure by blocking the logging thread rather than dropping records.
pub struct AsyncHandler {
    core: HandlerCore,
    inner: Arc<dyn Handler>,
    tx: Mutex<Option<Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncHandler {
    pub fn new(inner: Arc<dyn Handler>) -> Self {
        Self::with_capacity(inner, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn Handler>, capacity: usize) -> Self {
        let (tx, rx) = bounded::<Job>(capacity);
        let worker_inner = Arc::clone(&inner);
        let worker = std::thread::Builder::new()
            .name("hierlog-async".to_string())
            .spawn(move || {
                for (record, sender) in rx.iter() {
                    sender.resolve(worker_inner.handle(&record).wait());
                }
            })
            .ok();
        if worker.is_none() {
            eprintln!("hierlog: failed to spawn async handler worker");
        }
        Self {
            core: HandlerCore::new(),
            inner,
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(worker),
        }
    }

    /// Stop accepting records and wait for the queue to drain.
    ///
    /// Jobs already queued are still delivered. Returns an error if the
    /// worker does not finish within `timeout`.
    pub fn shutdown(&self, timeout: Duration) -> Result<()> {
        // closing the channel lets the worker loop run off the end
        self.tx.lock().take();
        let Some(handle) = self.worker.lock().take() else {
            return Ok(());
        };
        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                return Err(LogError::EmitTimeout(timeout));
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        handle.join().map_err(|_| {
            LogError::emit("async", "worker thread panicked during shutdown")
        })?;
        Ok(())
    }
}

impl Handler for AsyncHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<Record>) -> Completion {
        let (completion, sender) = Completion::deferred();
        let tx = self.tx.lock();
        match tx.as_ref() {
            Some(tx) => {
                if tx.send((Arc::clone(record), sender)).is_err() {
                    return Completion::failed(LogError::emit(
                        self.name(),
                        "worker queue is closed",
                    ));
                }
            }
            None => {
                return Completion::failed(LogError::emit(self.name(), "handler is shut down"))
            }
        }
        completion
    }

    fn name(&self) -> &str {
        "async"
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }
}

impl Drop for AsyncHandler {
    fn drop(&mut self) {
        let _ = self.shutdown(DRAIN_TIMEOUT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::INFO;
    use crate::core::record::Arg;
    use crate::handlers::StreamHandler;

    fn record(message: &str) -> Arc<Record> {
        Arc::new(Record::new("app", INFO, vec![Arg::from(message)]))
    }

    fn capture() -> (Arc<StreamHandler<Vec<u8>>>, AsyncHandler) {
        let sink = Arc::new(StreamHandler::new(Vec::new()));
        let handler = AsyncHandler::with_capacity(Arc::clone(&sink) as Arc<dyn Handler>, 16);
        (sink, handler)
    }

    #[test]
    fn test_completion_resolves_after_delivery() {
        let (sink, handler) = capture();
        handler.handle(&record("queued")).wait().unwrap();
        let output = sink.with_stream(|s| String::from_utf8(s.clone()).unwrap());
        assert_eq!(output, "queued\n");
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let (sink, handler) = capture();
        let mut completions = Vec::new();
        for i in 0..10 {
            completions.push(handler.handle(&record(&format!("line {}", i))));
        }
        handler.shutdown(Duration::from_secs(2)).unwrap();
        for completion in completions {
            completion.wait().unwrap();
        }
        let output = sink.with_stream(|s| String::from_utf8(s.clone()).unwrap());
        assert_eq!(output.lines().count(), 10);
    }

    #[test]
    fn test_wrapped_handler_level_still_applies() {
        use crate::core::level::ERROR;

        let sink = Arc::new(StreamHandler::new(Vec::new()));
        sink.core().set_level(ERROR).unwrap();
        let handler = AsyncHandler::with_capacity(Arc::clone(&sink) as Arc<dyn Handler>, 16);

        handler.handle(&record("below the inner threshold")).wait().unwrap();
        handler.shutdown(Duration::from_secs(2)).unwrap();

        let output = sink.with_stream(|s| String::from_utf8(s.clone()).unwrap());
        assert!(output.is_empty());
    }

    #[test]
    fn test_emit_after_shutdown_fails() {
        let (_sink, handler) = capture();
        handler.shutdown(Duration::from_secs(2)).unwrap();
        let result = handler.handle(&record("too late")).wait();
        assert!(matches!(result, Err(LogError::EmitFailed { .. })));
    }

    #[test]
    fn test_inner_failure_propagates_to_caller() {
        struct FailingSink {
            core: HandlerCore,
        }
        impl Handler for FailingSink {
            fn core(&self) -> &HandlerCore {
                &self.core
            }
            fn emit(&self, _record: &Arc<Record>) -> Completion {
                Completion::failed(LogError::other("sink broke"))
            }
            fn name(&self) -> &str {
                "failing"
            }
        }

        let handler = AsyncHandler::with_capacity(
            Arc::new(FailingSink {
                core: HandlerCore::new(),
            }),
            4,
        );
        let result = handler.handle(&record("doomed")).wait();
        assert!(result.is_err());
    }
}
