//! The structured representation of one log event

use super::json;
use super::level;
use super::printf;
use chrono::{DateTime, SecondsFormat, Utc};
use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::Value;
use std::backtrace::Backtrace;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Schema version of the JSON record form. Increment when the layout changes.
pub const LOG_VERSION: u32 = 1;

lazy_static! {
    static ref HOST: String = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".to_string());
}

/// One parsed frame of a captured call stack
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StackFrame {
    pub function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// A captured call stack: a rendered text form plus the parsed frames.
///
/// The text form starts with a newline so it can be appended directly after a
/// message line, and consecutive duplicate frames are collapsed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StackTrace {
    pub text: String,
    pub frames: Vec<StackFrame>,
}

impl StackTrace {
    /// Capture and parse the current call stack.
    pub fn capture() -> Self {
        Self::from_backtrace(&Backtrace::force_capture())
    }

    fn from_backtrace(backtrace: &Backtrace) -> Self {
        let rendered = backtrace.to_string();
        let mut frames: Vec<StackFrame> = Vec::new();
        let mut pending: Option<StackFrame> = None;

        for raw in rendered.lines() {
            let line = raw.trim();
            if let Some(at) = line.strip_prefix("at ") {
                // location line belonging to the previous frame
                if let Some(frame) = pending.as_mut() {
                    let mut location = at.to_string();
                    // trailing column number is noise
                    if let Some(idx) = location.rfind(':') {
                        if location[idx + 1..].chars().all(|c| c.is_ascii_digit()) {
                            let file_line = location[..idx].to_string();
                            if let Some(line_idx) = file_line.rfind(':') {
                                if file_line[line_idx + 1..]
                                    .chars()
                                    .all(|c| c.is_ascii_digit())
                                {
                                    frame.line = file_line[line_idx + 1..].parse().ok();
                                    location = file_line[..line_idx].to_string();
                                } else {
                                    location = file_line;
                                }
                            } else {
                                location = file_line;
                            }
                        }
                    }
                    frame.file = Some(location);
                }
                continue;
            }
            if let Some((index, symbol)) = line.split_once(": ") {
                if index.chars().all(|c| c.is_ascii_digit()) {
                    if let Some(done) = pending.take() {
                        frames.push(done);
                    }
                    pending = Some(StackFrame {
                        function: symbol.to_string(),
                        file: None,
                        line: None,
                    });
                }
            }
        }
        if let Some(done) = pending.take() {
            frames.push(done);
        }

        frames.retain(|f| !is_internal_frame(&f.function));
        frames.dedup_by(|a, b| a.function == b.function);

        let text = if frames.is_empty() {
            "\n    at <unresolved>".to_string()
        } else {
            frames
                .iter()
                .map(|f| match (&f.file, f.line) {
                    (Some(file), Some(line)) => {
                        format!("\n    at {} ({}:{})", f.function, file, line)
                    }
                    (Some(file), None) => format!("\n    at {} ({})", f.function, file),
                    _ => format!("\n    at {}", f.function),
                })
                .collect()
        };

        Self { text, frames }
    }
}

fn is_internal_frame(function: &str) -> bool {
    function.starts_with("std::backtrace")
        || function.starts_with("backtrace::")
        || function.contains("hierlog::core::record::StackTrace")
        || function.contains("hierlog::core::record::CapturedError")
}

/// An error argument captured into a record: message, stack, uncaught tag
#[derive(Debug, Clone, Serialize)]
pub struct CapturedError {
    pub message: String,
    pub stack: StackTrace,
    pub uncaught: bool,
}

impl CapturedError {
    /// Capture an error and the call stack at the capture site.
    ///
    /// The error's source chain is folded into the message so nothing from
    /// `Display` context is lost.
    pub fn from_error(err: &(dyn std::error::Error + '_)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self {
            message,
            stack: StackTrace::capture(),
            uncaught: false,
        }
    }

    /// Build directly from a message, used by the uncaught-exception hook.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: StackTrace::capture(),
            uncaught: false,
        }
    }

    /// Tag this error as having come from the uncaught-exception channel.
    #[must_use]
    pub fn tag_uncaught(mut self) -> Self {
        self.uncaught = true;
        self
    }
}

/// A typed log-call argument.
///
/// The first argument of a call is usually a `Str` template; the rest are
/// interpolation values. `Error` and `Trace` arguments additionally populate
/// the record's stack fields, and `Lazy` defers stringification until the
/// message is actually rendered.
#[derive(Clone)]
pub enum Arg {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Json(Value),
    Error(CapturedError),
    Trace(StackTrace),
    Lazy(Arc<dyn Fn() -> String + Send + Sync>),
}

impl Arg {
    /// Capture an error argument, including a stack snapshot taken here.
    pub fn error(err: &(dyn std::error::Error + '_)) -> Self {
        Arg::Error(CapturedError::from_error(err))
    }

    /// An explicit trace marker: attaches the current call stack to the
    /// record without marking it as an exception.
    pub fn trace_marker() -> Self {
        Arg::Trace(StackTrace::capture())
    }

    /// A deferred argument, stringified at most once when the message is
    /// first rendered.
    pub fn lazy(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Arg::Lazy(Arc::new(f))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view used by `%d` conversions.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Arg::Int(n) => Some(*n as f64),
            Arg::Float(f) => Some(*f),
            Arg::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Arg::Str(s) => s.trim().parse().ok(),
            Arg::Json(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Default stringification used by `%s` and plain joins.
    pub fn to_display(&self) -> String {
        match self {
            Arg::Str(s) => s.clone(),
            Arg::Int(n) => n.to_string(),
            Arg::Float(f) => f.to_string(),
            Arg::Bool(b) => b.to_string(),
            Arg::Json(v) => match v {
                Value::String(s) => s.clone(),
                other => json::stringify(other),
            },
            Arg::Error(e) => e.message.clone(),
            Arg::Trace(_) => String::new(),
            Arg::Lazy(f) => f(),
        }
    }

    /// JSON form used by `%O`/`%j` and the record schema.
    pub fn to_json(&self) -> Value {
        match self {
            Arg::Str(s) => Value::String(s.clone()),
            Arg::Int(n) => Value::from(*n),
            Arg::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Arg::Bool(b) => Value::Bool(*b),
            Arg::Json(v) => v.clone(),
            Arg::Error(e) => Value::String(e.message.clone()),
            Arg::Trace(_) => Value::String("[Trace]".to_string()),
            Arg::Lazy(f) => Value::String(f()),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Arg::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Arg::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Arg::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Arg::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Arg::Error(e) => f.debug_tuple("Error").field(&e.message).finish(),
            Arg::Trace(_) => f.write_str("Trace"),
            Arg::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Int(n)
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Arg::Int(n as i64)
    }
}

impl From<u32> for Arg {
    fn from(n: u32) -> Self {
        Arg::Int(n as i64)
    }
}

impl From<usize> for Arg {
    fn from(n: usize) -> Self {
        Arg::Int(n as i64)
    }
}

impl From<f64> for Arg {
    fn from(f: f64) -> Self {
        Arg::Float(f)
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Json(v)
    }
}

/// The argument list of one log call.
///
/// Converts from a single message, a prepared `Vec<Arg>` (usually via the
/// `args!` macro), or a single [`Arg`].
#[derive(Debug, Clone, Default)]
pub struct Arguments(pub Vec<Arg>);

impl From<&str> for Arguments {
    fn from(s: &str) -> Self {
        Arguments(vec![Arg::from(s)])
    }
}

impl From<String> for Arguments {
    fn from(s: String) -> Self {
        Arguments(vec![Arg::from(s)])
    }
}

impl From<Vec<Arg>> for Arguments {
    fn from(args: Vec<Arg>) -> Self {
        Arguments(args)
    }
}

impl From<Arg> for Arguments {
    fn from(arg: Arg) -> Self {
        Arguments(vec![arg])
    }
}

/// One log event.
///
/// Created by a `Logger` at call time and shared read-only across every
/// handler and ancestor logger of one propagation sweep. The derived message
/// is memoized explicitly: computed at most once, on first access.
#[derive(Debug)]
pub struct Record {
    pub name: String,
    pub level: i32,
    pub levelname: String,
    pub timestamp: DateTime<Utc>,
    pub pid: u32,
    pub host: String,
    pub v: u32,
    pub stack: Option<StackTrace>,
    pub exception: bool,
    pub uncaught_exception: bool,
    args: Vec<Arg>,
    message: OnceLock<String>,
}

impl Record {
    pub fn new(name: impl Into<String>, level: i32, args: Vec<Arg>) -> Self {
        // scan from the end: the last error or trace marker wins
        let mut stack = None;
        let mut exception = false;
        let mut uncaught = false;
        for arg in args.iter().rev() {
            match arg {
                Arg::Error(e) => {
                    stack = Some(e.stack.clone());
                    exception = true;
                    uncaught = e.uncaught;
                    break;
                }
                Arg::Trace(t) => {
                    stack = Some(t.clone());
                    break;
                }
                _ => {}
            }
        }

        Self {
            name: name.into(),
            level,
            levelname: level::get_level_name(level).unwrap_or_else(|| level.to_string()),
            timestamp: Utc::now(),
            pid: std::process::id(),
            host: HOST.clone(),
            v: LOG_VERSION,
            stack,
            exception,
            uncaught_exception: uncaught,
            args,
            message: OnceLock::new(),
        }
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// The rendered message, computed on first access and cached.
    pub fn message(&self) -> &str {
        self.message.get_or_init(|| format_message(&self.args))
    }

    /// JSON form of the record, matching schema version [`LOG_VERSION`].
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("level".to_string(), Value::from(self.level));
        map.insert(
            "levelname".to_string(),
            Value::String(self.levelname.clone()),
        );
        map.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        map.insert(
            "args".to_string(),
            Value::Array(self.args.iter().map(Arg::to_json).collect()),
        );
        map.insert("pid".to_string(), Value::from(self.pid));
        map.insert("host".to_string(), Value::String(self.host.clone()));
        map.insert("v".to_string(), Value::from(self.v));
        if let Some(stack) = &self.stack {
            map.insert(
                "stack".to_string(),
                serde_json::to_value(&stack.frames).unwrap_or(Value::Null),
            );
        }
        if self.exception {
            map.insert("exception".to_string(), Value::Bool(true));
        }
        if self.uncaught_exception {
            map.insert("uncaughtException".to_string(), Value::Bool(true));
        }
        Value::Object(map)
    }
}

/// Message derivation: a lone string arg is the message verbatim; a string
/// followed by more args is a printf template over them; anything else is
/// every arg stringified and joined with spaces.
fn format_message(args: &[Arg]) -> String {
    match args.split_first() {
        None => String::new(),
        Some((Arg::Str(template), [])) => template.clone(),
        Some((Arg::Str(template), rest)) => printf::format(template, rest),
        Some(_) => args
            .iter()
            .map(Arg::to_display)
            .collect::<Vec<_>>()
            .join(" "),
    }
}
