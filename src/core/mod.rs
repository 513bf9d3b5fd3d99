//! Core logging machinery

pub mod completion;
pub mod config;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod handler;
pub mod json;
pub mod level;
pub mod logger;
pub mod printf;
pub mod record;

pub use completion::{Completion, CompletionSender};
pub use config::{
    basic_config, configure, BasicConfig, BasicTarget, Config, FilterDef, FormatterDef,
    HandlerDef, HandlerKind, LoggerDef,
};
pub use error::{LogError, Result};
pub use filter::{Filter, Filterer};
pub use formatter::{Formatter, BASIC_FORMAT, MESSAGE_ONLY, TO_JSON};
pub use handler::{Handler, HandlerCore};
pub use level::{LevelColor, LevelDef, LevelSpec, LevelsConfig};
pub use logger::{
    handle_exceptions, unhandle_exceptions, Logger, Registry, DEFAULT_EXCEPTION_FLUSH_TIMEOUT,
    ROOT,
};
pub use record::{Arg, Arguments, CapturedError, Record, StackFrame, StackTrace};
