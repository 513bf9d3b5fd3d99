//! Handler writing formatted records to any `Write` sink

use crate::core::completion::Completion;
use crate::core::error::{LogError, Result};
use crate::core::formatter::Formatter;
use crate::core::handler::{Handler, HandlerCore};
use crate::core::record::Record;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Writes one formatted line per record to an owned stream.
///
/// The workhorse behind in-memory capture in tests and ad-hoc sinks like
/// pipes or sockets. Each emit appends a newline and flushes, so lines are
/// visible as soon as the dispatch completes.
pub struct StreamHandler<W: Write + Send> {
    core: HandlerCore,
    stream: Mutex<W>,
}

impl<W: Write + Send> StreamHandler<W> {
    pub fn new(stream: W) -> Self {
        Self {
            core: HandlerCore::new(),
            stream: Mutex::new(stream),
        }
    }

    #[must_use]
    pub fn with_formatter(self, formatter: Formatter) -> Self {
        self.core.set_formatter(formatter);
        self
    }

    /// Borrow the underlying stream, e.g. to inspect captured output.
    pub fn with_stream<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.stream.lock())
    }
}

impl<W: Write + Send> Handler for StreamHandler<W> {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<Record>) -> Completion {
        let mut line = self.core.format(record);
        line.push('\n');
        let mut stream = self.stream.lock();
        let result = stream
            .write_all(line.as_bytes())
            .and_then(|_| stream.flush());
        match result {
            Ok(()) => Completion::done(),
            Err(e) => Completion::failed(LogError::emit(self.name(), e.to_string())),
        }
    }

    fn name(&self) -> &str {
        "stream"
    }

    fn flush(&self) -> Result<()> {
        self.stream.lock().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formatter::BASIC_FORMAT;
    use crate::core::level::INFO;
    use crate::core::record::Arg;

    fn record(message: &str) -> Arc<Record> {
        Arc::new(Record::new("app", INFO, vec![Arg::from(message)]))
    }

    #[test]
    fn test_writes_one_line_per_record() {
        let handler = StreamHandler::new(Vec::new());
        handler.handle(&record("first")).wait().unwrap();
        handler.handle(&record("second")).wait().unwrap();
        let output = handler.with_stream(|s| String::from_utf8(s.clone()).unwrap());
        assert_eq!(output, "first\nsecond\n");
    }

    #[test]
    fn test_formatter_applies() {
        let handler =
            StreamHandler::new(Vec::new()).with_formatter(Formatter::new(BASIC_FORMAT));
        handler.handle(&record("hello")).wait().unwrap();
        let output = handler.with_stream(|s| String::from_utf8(s.clone()).unwrap());
        assert_eq!(output, "app.INFO: hello\n");
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_fails_completion() {
        let handler = StreamHandler::new(FailingWriter);
        let result = handler.handle(&record("lost")).wait();
        assert!(matches!(result, Err(LogError::EmitFailed { .. })));
    }
}
