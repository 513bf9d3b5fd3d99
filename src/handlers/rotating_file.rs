//! Size-based rotating file handler

use crate::core::completion::Completion;
use crate::core::error::{LogError, Result};
use crate::core::formatter::Formatter;
use crate::core::handler::{Handler, HandlerCore};
use crate::core::record::Record;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct RotationState {
    writer: BufWriter<File>,
    size: u64,
}

/// Appends to a file and rotates it when it would exceed a size limit.
///
/// Rotation renames the chain backwards: `app.log.2` becomes `app.log.3`,
/// `app.log.1` becomes `app.log.2`, the live file becomes `app.log.1`, and a
/// fresh live file is opened. The suffix past `max_files` is deleted, so at
/// most `max_files` rotated generations exist beside the live file.
pub struct RotatingFileHandler {
    core: HandlerCore,
    path: PathBuf,
    max_size: u64,
    max_files: usize,
    state: Mutex<RotationState>,
}

impl RotatingFileHandler {
    pub fn new(path: impl AsRef<Path>, max_size: u64, max_files: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = super::file::open_append(&path)?;
        let size = file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| LogError::file_handler(path.display().to_string(), e.to_string()))?;
        Ok(Self {
            core: HandlerCore::new(),
            path,
            max_size,
            max_files,
            state: Mutex::new(RotationState {
                writer: BufWriter::new(file),
                size,
            }),
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

    fn numbered(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&self, state: &mut RotationState) -> Result<()> {
        state
            .writer
            .flush()
            .map_err(|e| self.rotation_error(e.to_string()))?;

        if self.max_files == 0 {
            // no generations kept: truncate in place
            let file = File::create(&self.path)
                .map_err(|e| self.rotation_error(e.to_string()))?;
            state.writer = BufWriter::new(file);
            state.size = 0;
            return Ok(());
        }

        let overflow = self.numbered(self.max_files);
        if overflow.exists() {
            fs::remove_file(&overflow).map_err(|e| self.rotation_error(e.to_string()))?;
        }
        for index in (1..self.max_files).rev() {
            let src = self.numbered(index);
            if src.exists() {
                rename_or_copy(&src, &self.numbered(index + 1))
                    .map_err(|e| self.rotation_error(e.to_string()))?;
            }
        }
        rename_or_copy(&self.path, &self.numbered(1))
            .map_err(|e| self.rotation_error(e.to_string()))?;

        let file =
            super::file::open_append(&self.path).map_err(|e| self.rotation_error(e.to_string()))?;
        state.writer = BufWriter::new(file);
        state.size = 0;
        Ok(())
    }

    fn rotation_error(&self, message: String) -> LogError {
        LogError::file_rotation(self.path.display().to_string(), message)
    }
}

/// Rename, falling back to copy-and-delete for cross-filesystem moves.
fn rename_or_copy(src: &Path, dst: &Path) -> std::io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dst)?;
            fs::remove_file(src)
        }
    }
}

impl Handler for RotatingFileHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<Record>) -> Completion {
        let mut line = self.core.format(record);
        line.push('\n');
        let len = line.len() as u64;

        let mut state = self.state.lock();
        if state.size > 0 && state.size + len > self.max_size {
            if let Err(e) = self.rotate(&mut state) {
                return Completion::failed(e);
            }
        }
        match state.writer.write_all(line.as_bytes()) {
            Ok(()) => {
                state.size += len;
                Completion::done()
            }
            Err(e) => Completion::failed(LogError::file_handler(
                self.path.display().to_string(),
                e.to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "rotating_file"
    }

    fn flush(&self) -> Result<()> {
        self.state
            .lock()
            .writer
            .flush()
            .map_err(|e| LogError::file_handler(self.path.display().to_string(), e.to_string()))
    }
}

impl Drop for RotatingFileHandler {
    fn drop(&mut self) {
        let _ = self.state.lock().writer.flush();
    }
}
