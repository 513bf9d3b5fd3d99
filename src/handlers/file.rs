//! Handler appending formatted records to a file

use crate::core::completion::Completion;
use crate::core::error::{LogError, Result};
use crate::core::formatter::Formatter;
use crate::core::handler::{Handler, HandlerCore};
use crate::core::record::Record;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Appends one formatted line per record to a file.
///
/// The file (and any missing parent directories) is created on construction
/// and opened in append mode, so multiple runs accumulate. Writes are
/// buffered; [`flush`](Handler::flush) forces them to disk.
pub struct FileHandler {
    core: HandlerCore,
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileHandler {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        Ok(Self {
            core: HandlerCore::new(),
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    #[must_use]
    pub fn with_formatter(self, formatter: Formatter) -> Self {
        self.core.set_formatter(formatter);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub(crate) fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LogError::file_handler(path.display().to_string(), e.to_string())
            })?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LogError::file_handler(path.display().to_string(), e.to_string()))
}

impl Handler for FileHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<Record>) -> Completion {
        let mut line = self.core.format(record);
        line.push('\n');
        match self.writer.lock().write_all(line.as_bytes()) {
            Ok(()) => Completion::done(),
            Err(e) => Completion::failed(LogError::file_handler(
                self.path.display().to_string(),
                e.to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "file"
    }

    fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .flush()
            .map_err(|e| LogError::file_handler(self.path.display().to_string(), e.to_string()))
    }
}

impl Drop for FileHandler {
    fn drop(&mut self) {
        let _ = self.writer.lock().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formatter::BASIC_FORMAT;
    use crate::core::level::INFO;
    use crate::core::record::Arg;
    use tempfile::TempDir;

    fn record(message: &str) -> Arc<Record> {
        Arc::new(Record::new("app", INFO, vec![Arg::from(message)]))
    }

    #[test]
    fn test_appends_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let handler = FileHandler::new(&path)
            .unwrap()
            .with_formatter(Formatter::new(BASIC_FORMAT));
        handler.handle(&record("one")).wait().unwrap();
        handler.handle(&record("two")).wait().unwrap();
        handler.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "app.INFO: one\napp.INFO: two\n");
    }

    #[test]
    fn test_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/app.log");
        let handler = FileHandler::new(&path).unwrap();
        handler.handle(&record("created")).wait().unwrap();
        handler.flush().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_reopening_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        {
            let handler = FileHandler::new(&path).unwrap();
            handler.handle(&record("first run")).wait().unwrap();
        }
        {
            let handler = FileHandler::new(&path).unwrap();
            handler.handle(&record("second run")).wait().unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
