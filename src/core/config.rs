//! One-call and declarative configuration

use super::error::{LogError, Result};
use super::filter::Filter;
use super::formatter::{Formatter, BASIC_FORMAT};
use super::handler::Handler;
use super::level::LevelSpec;
use super::logger::Registry;
use crate::handlers::{ConsoleHandler, FileHandler, NullHandler, RotatingFileHandler};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where [`basic_config`] sends root output.
pub enum BasicTarget {
    Console,
    File(PathBuf),
    Handler(Arc<dyn Handler>),
}

/// Options for [`basic_config`].
pub struct BasicConfig {
    level: Option<LevelSpec>,
    format: Option<String>,
    target: BasicTarget,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicConfig {
    pub fn new() -> Self {
        Self {
            level: None,
            format: None,
            target: BasicTarget::Console,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = BasicTarget::File(path.into());
        self
    }

    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.target = BasicTarget::Handler(handler);
        self
    }
}

/// Attach one handler to the root logger with minimal ceremony.
///
/// Does nothing if the root already has handlers, so a library calling this
/// defensively never clobbers the application's setup. The built-in console
/// and file targets get the `name.LEVELNAME: message` format unless another
/// template is given; a caller-supplied handler keeps its own formatter.
pub fn basic_config(registry: &Registry, config: BasicConfig) -> Result<()> {
    let root = registry.root();
    if root.has_handlers() {
        return Ok(());
    }

    let formatter = Formatter::new(config.format.as_deref().unwrap_or(BASIC_FORMAT));
    let handler: Arc<dyn Handler> = match config.target {
        BasicTarget::Console => Arc::new(ConsoleHandler::new().with_formatter(formatter)),
        BasicTarget::File(path) => Arc::new(FileHandler::new(path)?.with_formatter(formatter)),
        BasicTarget::Handler(handler) => handler,
    };

    if let Some(level) = config.level {
        root.set_level(level)?;
    }
    root.add_handler(handler);
    Ok(())
}

/// A formatter entry in a [`Config`].
pub enum FormatterDef {
    Template {
        format: String,
        datefmt: Option<String>,
        colorize: bool,
        strip: bool,
    },
    Custom(Formatter),
}

impl FormatterDef {
    pub fn template(format: impl Into<String>) -> Self {
        FormatterDef::Template {
            format: format.into(),
            datefmt: None,
            colorize: false,
            strip: false,
        }
    }

    fn build(&self) -> Formatter {
        match self {
            FormatterDef::Template {
                format,
                datefmt,
                colorize,
                strip,
            } => {
                let mut formatter = Formatter::new(format.clone())
                    .with_colorize(*colorize)
                    .with_strip(*strip);
                if let Some(datefmt) = datefmt {
                    formatter = formatter.with_datefmt(datefmt.clone());
                }
                formatter
            }
            FormatterDef::Custom(formatter) => formatter.clone(),
        }
    }
}

/// A filter entry in a [`Config`].
pub enum FilterDef {
    /// Dotted namespace prefix
    Name(String),
    /// Regular expression over the rendered message
    Pattern(String),
    Custom(Arc<Filter>),
}

impl FilterDef {
    fn build(&self, key: &str) -> Result<Arc<Filter>> {
        match self {
            FilterDef::Name(prefix) => Ok(Arc::new(Filter::name(prefix.clone()))),
            FilterDef::Pattern(pattern) => Filter::pattern_str(pattern)
                .map(Arc::new)
                .map_err(|e| LogError::config(format!("filters.{}", key), e.to_string())),
            FilterDef::Custom(filter) => Ok(Arc::clone(filter)),
        }
    }
}

/// The sink a configured handler writes to.
pub enum HandlerKind {
    Console,
    File(PathBuf),
    RotatingFile {
        path: PathBuf,
        max_size: u64,
        max_files: usize,
    },
    Null,
    Custom(Arc<dyn Handler>),
}

/// A handler entry in a [`Config`]: a sink plus references to formatter and
/// filter entries by key.
pub struct HandlerDef {
    pub kind: HandlerKind,
    pub level: Option<LevelSpec>,
    pub formatter: Option<String>,
    pub filters: Vec<String>,
    pub timeout: Option<Duration>,
}

impl HandlerDef {
    pub fn new(kind: HandlerKind) -> Self {
        Self {
            kind,
            level: None,
            formatter: None,
            filters: Vec::new(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, key: impl Into<String>) -> Self {
        self.formatter = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>) -> Self {
        self.filters.push(key.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A logger entry in a [`Config`], referencing handler and filter entries by
/// key.
#[derive(Default)]
pub struct LoggerDef {
    pub level: Option<LevelSpec>,
    pub propagate: Option<bool>,
    pub handlers: Vec<String>,
    pub filters: Vec<String>,
}

impl LoggerDef {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use]
    pub fn with_propagate(mut self, propagate: bool) -> Self {
        self.propagate = Some(propagate);
        self
    }

    #[must_use]
    pub fn with_handler(mut self, key: impl Into<String>) -> Self {
        self.handlers.push(key.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>) -> Self {
        self.filters.push(key.into());
        self
    }
}

/// A whole-hierarchy configuration: named formatters, filters, and handlers,
/// wired onto loggers by key.
#[derive(Default)]
pub struct Config {
    pub formatters: HashMap<String, FormatterDef>,
    pub filters: HashMap<String, FilterDef>,
    pub handlers: HashMap<String, HandlerDef>,
    pub loggers: HashMap<String, LoggerDef>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn formatter(mut self, key: impl Into<String>, def: FormatterDef) -> Self {
        self.formatters.insert(key.into(), def);
        self
    }

    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, def: FilterDef) -> Self {
        self.filters.insert(key.into(), def);
        self
    }

    #[must_use]
    pub fn handler(mut self, key: impl Into<String>, def: HandlerDef) -> Self {
        self.handlers.insert(key.into(), def);
        self
    }

    #[must_use]
    pub fn logger(mut self, name: impl Into<String>, def: LoggerDef) -> Self {
        self.loggers.insert(name.into(), def);
        self
    }
}

/// Apply a [`Config`] to a registry.
///
/// Wiring order is formatters, then filters, then handlers, then loggers, so
/// every reference points at something already built. A reference to a
/// missing key fails the whole call; partially applied logger wiring from an
/// earlier entry is not rolled back.
pub fn configure(registry: &Registry, config: Config) -> Result<()> {
    let mut formatters: HashMap<&str, Formatter> = HashMap::new();
    for (key, def) in &config.formatters {
        formatters.insert(key, def.build());
    }

    let mut filters: HashMap<&str, Arc<Filter>> = HashMap::new();
    for (key, def) in &config.filters {
        filters.insert(key, def.build(key)?);
    }

    let mut handlers: HashMap<&str, Arc<dyn Handler>> = HashMap::new();
    for (key, def) in &config.handlers {
        let handler: Arc<dyn Handler> = match &def.kind {
            HandlerKind::Console => Arc::new(ConsoleHandler::new()),
            HandlerKind::File(path) => Arc::new(FileHandler::new(path)?),
            HandlerKind::RotatingFile {
                path,
                max_size,
                max_files,
            } => Arc::new(RotatingFileHandler::new(path, *max_size, *max_files)?),
            HandlerKind::Null => Arc::new(NullHandler::new()),
            HandlerKind::Custom(handler) => Arc::clone(handler),
        };

        if let Some(level) = &def.level {
            handler
                .core()
                .set_level(level.clone())
                .map_err(|e| LogError::config(format!("handlers.{}", key), e.to_string()))?;
        }
        if let Some(formatter_key) = &def.formatter {
            let formatter = formatters.get(formatter_key.as_str()).ok_or_else(|| {
                LogError::config(
                    format!("handlers.{}", key),
                    format!("unknown formatter '{}'", formatter_key),
                )
            })?;
            handler.core().set_formatter(formatter.clone());
        }
        for filter_key in &def.filters {
            let filter = filters.get(filter_key.as_str()).ok_or_else(|| {
                LogError::config(
                    format!("handlers.{}", key),
                    format!("unknown filter '{}'", filter_key),
                )
            })?;
            handler.core().add_filter(Arc::clone(filter));
        }
        if let Some(timeout) = def.timeout {
            handler.core().set_timeout(Some(timeout));
        }
        handlers.insert(key, handler);
    }

    for (name, def) in &config.loggers {
        let logger = registry.get_logger(name);
        if let Some(level) = &def.level {
            logger
                .set_level(level.clone())
                .map_err(|e| LogError::config(format!("loggers.{}", name), e.to_string()))?;
        }
        if let Some(propagate) = def.propagate {
            logger.set_propagate(propagate);
        }
        for handler_key in &def.handlers {
            let handler = handlers.get(handler_key.as_str()).ok_or_else(|| {
                LogError::config(
                    format!("loggers.{}", name),
                    format!("unknown handler '{}'", handler_key),
                )
            })?;
            logger.add_handler(Arc::clone(handler));
        }
        for filter_key in &def.filters {
            let filter = filters.get(filter_key.as_str()).ok_or_else(|| {
                LogError::config(
                    format!("loggers.{}", name),
                    format!("unknown filter '{}'", filter_key),
                )
            })?;
            logger.add_filter(Arc::clone(filter));
        }
    }

    Ok(())
}
