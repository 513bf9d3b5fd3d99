//! The handler abstraction shared by every sink

use super::completion::Completion;
use super::error::{LogError, Result};
use super::filter::{Filter, Filterer};
use super::formatter::Formatter;
use super::level::{self, LevelSpec, ALL};
use super::record::Record;
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// The state every handler composes: its own threshold, filter chain,
/// formatter, and optional delivery timeout.
#[derive(Debug, Default)]
pub struct HandlerCore {
    level: RwLock<i32>,
    filters: Filterer,
    formatter: RwLock<Formatter>,
    timeout: RwLock<Option<Duration>>,
}

impl HandlerCore {
    pub fn new() -> Self {
        Self {
            level: RwLock::new(ALL),
            filters: Filterer::new(),
            formatter: RwLock::new(Formatter::default()),
            timeout: RwLock::new(None),
        }
    }

    pub fn with_level(self, spec: impl Into<LevelSpec>) -> Result<Self> {
        self.set_level(spec)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_formatter(self, formatter: Formatter) -> Self {
        *self.formatter.write() = formatter;
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        *self.timeout.write() = Some(timeout);
        self
    }

    pub fn level(&self) -> i32 {
        *self.level.read()
    }

    pub fn set_level(&self, spec: impl Into<LevelSpec>) -> Result<()> {
        let spec = spec.into();
        let level = level::get_level(spec.clone()).ok_or_else(|| LogError::invalid_level(spec))?;
        *self.level.write() = level;
        Ok(())
    }

    pub fn set_formatter(&self, formatter: Formatter) {
        *self.formatter.write() = formatter;
    }

    pub fn set_timeout(&self, timeout: Option<Duration>) {
        *self.timeout.write() = timeout;
    }

    pub fn timeout(&self) -> Option<Duration> {
        *self.timeout.read()
    }

    pub fn add_filter(&self, filter: Arc<Filter>) {
        self.filters.add_filter(filter);
    }

    pub fn remove_filter(&self, filter: &Arc<Filter>) {
        self.filters.remove_filter(filter);
    }

    pub fn accepts(&self, record: &Record) -> bool {
        self.filters.accepts(record)
    }

    /// Render the record with the handler's current formatter.
    pub fn format(&self, record: &Record) -> String {
        self.formatter.read().format(record)
    }
}

/// A sink for records.
///
/// Implementations supply [`emit`](Handler::emit); the provided
/// [`handle`](Handler::handle) wraps it with the shared per-handler pipeline:
/// level gate, filter chain, panic isolation, and the optional delivery
/// timeout. Dispatching loggers check the threshold too as a fast path, but
/// the gate here is authoritative so wrapping handlers cannot bypass it.
pub trait Handler: Send + Sync {
    /// The composed per-handler state.
    fn core(&self) -> &HandlerCore;

    /// Write one record to the sink.
    fn emit(&self, record: &Arc<Record>) -> Completion;

    /// Identifies the handler in error reports.
    fn name(&self) -> &str;

    /// Flush any buffered output.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Run the record through the level gate and filters, then emit,
    /// isolating panics.
    ///
    /// A panicking `emit` resolves the completion with
    /// [`LogError::HandlerPanic`] instead of unwinding into the caller, so
    /// one broken sink cannot take down the dispatch sweep.
    fn handle(&self, record: &Arc<Record>) -> Completion {
        let core = self.core();
        if record.level < core.level() || !core.accepts(record) {
            return Completion::done();
        }
        let completion = match catch_unwind(AssertUnwindSafe(|| self.emit(record))) {
            Ok(completion) => completion,
            Err(panic) => Completion::failed(LogError::HandlerPanic(panic_message(&panic))),
        };
        match core.timeout() {
            Some(timeout) => completion.with_timeout(timeout),
            None => completion,
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::{INFO, WARN};
    use crate::core::record::Arg;
    use parking_lot::Mutex;

    struct CollectingHandler {
        core: HandlerCore,
        lines: Mutex<Vec<String>>,
    }

    impl CollectingHandler {
        fn new() -> Self {
            Self {
                core: HandlerCore::new(),
                lines: Mutex::new(Vec::new()),
            }
        }
    }

    impl Handler for CollectingHandler {
        fn core(&self) -> &HandlerCore {
            &self.core
        }

        fn emit(&self, record: &Arc<Record>) -> Completion {
            self.lines.lock().push(self.core.format(record));
            Completion::done()
        }

        fn name(&self) -> &str {
            "collecting"
        }
    }

    struct PanickingHandler {
        core: HandlerCore,
    }

    impl Handler for PanickingHandler {
        fn core(&self) -> &HandlerCore {
            &self.core
        }

        fn emit(&self, _record: &Arc<Record>) -> Completion {
            panic!("sink exploded");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn record(name: &str, message: &str) -> Arc<Record> {
        Arc::new(Record::new(name, INFO, vec![Arg::from(message)]))
    }

    #[test]
    fn test_handle_emits_accepted_records() {
        let handler = CollectingHandler::new();
        assert!(handler.handle(&record("app", "hello")).wait().is_ok());
        assert_eq!(handler.lines.lock().as_slice(), ["hello"]);
    }

    #[test]
    fn test_handle_skips_filtered_records() {
        let handler = CollectingHandler::new();
        handler.core.add_filter(Arc::new(Filter::name("app.db")));
        assert!(handler.handle(&record("web", "nope")).wait().is_ok());
        assert!(handler.lines.lock().is_empty());
    }

    #[test]
    fn test_handle_captures_panics() {
        let handler = PanickingHandler {
            core: HandlerCore::new(),
        };
        let result = handler.handle(&record("app", "boom")).wait();
        match result {
            Err(LogError::HandlerPanic(message)) => assert_eq!(message, "sink exploded"),
            other => panic!("expected HandlerPanic, got {:?}", other),
        }
    }

    #[test]
    fn test_handle_enforces_own_level() {
        let handler = CollectingHandler::new();
        handler.core.set_level(WARN).unwrap();
        // calling handle directly must still respect the threshold
        assert!(handler.handle(&record("app", "too quiet")).wait().is_ok());
        assert!(handler.lines.lock().is_empty());
    }

    #[test]
    fn test_core_level_resolution() {
        let core = HandlerCore::new();
        assert_eq!(core.level(), ALL);
        core.set_level("warn").unwrap();
        assert_eq!(core.level(), WARN);
        assert!(core.set_level("nonsense").is_err());
        assert_eq!(core.level(), WARN);
    }
}
