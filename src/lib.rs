//! # hierlog
//!
//! A hierarchical, level-filtered logging framework. Loggers live in a
//! dotted namespace (`app`, `app.db`, `app.db.pool`), inherit thresholds
//! from their ancestors, and propagate accepted records up the tree to
//! whatever handlers are attached along the way. Every log call returns a
//! [`Completion`] that resolves when the record has actually reached its
//! sinks, including sinks running behind an async queue.
//!
//! ## Quick start
//!
//! ```
//! use hierlog::{args, BasicConfig, Registry, INFO};
//!
//! let registry = Registry::new();
//! hierlog::basic_config_on(&registry, BasicConfig::new().with_level(INFO)).unwrap();
//!
//! let logger = registry.get_logger("app.db");
//! logger.info(args!["connected to %s in %dms", "replica-2", 14]);
//! ```
//!
//! ## The process-wide hierarchy
//!
//! Most applications use the default registry through the crate-level
//! functions:
//!
//! ```
//! let logger = hierlog::get_logger("app.worker");
//! ```

pub mod core;
pub mod handlers;
mod macros;

pub use crate::core::completion::{Completion, CompletionSender};
pub use crate::core::config::{
    configure, BasicConfig, BasicTarget, Config, FilterDef, FormatterDef, HandlerDef,
    HandlerKind, LoggerDef,
};
pub use crate::core::error::{LogError, Result};
pub use crate::core::filter::{Filter, Filterer};
pub use crate::core::formatter::{Formatter, BASIC_FORMAT, MESSAGE_ONLY, TO_JSON};
pub use crate::core::handler::{Handler, HandlerCore};
pub use crate::core::level::{
    get_level, get_level_name, reset_levels, set_levels, LevelColor, LevelDef, LevelSpec,
    LevelsConfig, ALL, CRITICAL, DEBUG, ERROR, INFO, NONE, TRACE, VERBOSE, WARN,
};
pub use crate::core::logger::{
    handle_exceptions, unhandle_exceptions, Logger, Registry, DEFAULT_EXCEPTION_FLUSH_TIMEOUT,
    ROOT,
};
pub use crate::core::record::{Arg, Arguments, CapturedError, Record, StackFrame, StackTrace};
pub use crate::handlers::{
    AsyncHandler, ConsoleHandler, FileHandler, NullHandler, RotatingFileHandler, StreamHandler,
};

use lazy_static::lazy_static;
use std::sync::Arc;

lazy_static! {
    static ref DEFAULT_REGISTRY: Registry = Registry::new();
}

/// The registry behind the crate-level functions.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Get or create a logger in the default registry.
pub fn get_logger(name: &str) -> Arc<Logger> {
    DEFAULT_REGISTRY.get_logger(name)
}

/// The root logger of the default registry.
pub fn root() -> Arc<Logger> {
    DEFAULT_REGISTRY.root()
}

/// Apply a [`BasicConfig`] to the default registry's root logger. Does
/// nothing if the root already has handlers.
pub fn basic_config(config: BasicConfig) -> Result<()> {
    crate::core::config::basic_config(&DEFAULT_REGISTRY, config)
}

/// Apply a [`BasicConfig`] to an explicit registry.
pub fn basic_config_on(registry: &Registry, config: BasicConfig) -> Result<()> {
    crate::core::config::basic_config(registry, config)
}

/// Apply a declarative [`Config`] to the default registry.
pub fn configure_default(config: Config) -> Result<()> {
    configure(&DEFAULT_REGISTRY, config)
}

/// Tear down every logger in the default registry. Intended for tests.
pub fn reset() {
    DEFAULT_REGISTRY.reset();
}

/// Commonly used items in one import.
pub mod prelude {
    pub use crate::core::completion::Completion;
    pub use crate::core::error::{LogError, Result};
    pub use crate::core::filter::Filter;
    pub use crate::core::formatter::{Formatter, BASIC_FORMAT, MESSAGE_ONLY, TO_JSON};
    pub use crate::core::handler::{Handler, HandlerCore};
    pub use crate::core::level::{
        ALL, CRITICAL, DEBUG, ERROR, INFO, NONE, TRACE, VERBOSE, WARN,
    };
    pub use crate::core::logger::{Logger, Registry};
    pub use crate::core::record::{Arg, Arguments, Record};
    pub use crate::handlers::{
        AsyncHandler, ConsoleHandler, FileHandler, NullHandler, RotatingFileHandler,
        StreamHandler,
    };
}
