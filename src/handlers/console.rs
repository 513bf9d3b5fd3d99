//! Handler writing to the process stdout/stderr pair

use crate::core::completion::Completion;
use crate::core::error::{LogError, Result};
use crate::core::formatter::Formatter;
use crate::core::handler::{Handler, HandlerCore};
use crate::core::level::WARN;
use crate::core::record::Record;
use std::io::Write;
use std::sync::Arc;

/// Writes records to stdout, switching to stderr at and above a severity
/// threshold (WARN by default) so warnings and errors survive piped stdout.
pub struct ConsoleHandler {
    core: HandlerCore,
    stderr_threshold: i32,
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleHandler {
    pub fn new() -> Self {
        Self {
            core: HandlerCore::new(),
            stderr_threshold: WARN,
        }
    }

    #[must_use]
    pub fn with_formatter(self, formatter: Formatter) -> Self {
        self.core.set_formatter(formatter);
        self
    }

    /// Change the level at which output moves from stdout to stderr.
    #[must_use]
    pub fn with_stderr_threshold(mut self, level: i32) -> Self {
        self.stderr_threshold = level;
        self
    }
}

impl Handler for ConsoleHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<Record>) -> Completion {
        let mut line = self.core.format(record);
        line.push('\n');
        let result = if record.level >= self.stderr_threshold {
            let mut err = std::io::stderr().lock();
            err.write_all(line.as_bytes()).and_then(|_| err.flush())
        } else {
            let mut out = std::io::stdout().lock();
            out.write_all(line.as_bytes()).and_then(|_| out.flush())
        };
        match result {
            Ok(()) => Completion::done(),
            Err(e) => Completion::failed(LogError::emit(self.name(), e.to_string())),
        }
    }

    fn name(&self) -> &str {
        "console"
    }

    fn flush(&self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::{ERROR, INFO};
    use crate::core::record::Arg;

    #[test]
    fn test_emit_does_not_fail() {
        let handler = ConsoleHandler::new();
        let record = Arc::new(Record::new("app", INFO, vec![Arg::from("to stdout")]));
        assert!(handler.handle(&record).wait().is_ok());
        let record = Arc::new(Record::new("app", ERROR, vec![Arg::from("to stderr")]));
        assert!(handler.handle(&record).wait().is_ok());
    }

    #[test]
    fn test_stderr_threshold_is_adjustable() {
        let handler = ConsoleHandler::new().with_stderr_threshold(ERROR);
        assert_eq!(handler.stderr_threshold, ERROR);
    }
}
