//! Record formatting: templates, date formats, colors

use super::json;
use super::level;
use super::printf;
use super::record::Record;
use colored::Colorize;
use lazy_static::lazy_static;
use regex::Regex;

/// Template rendering only the message (and any captured stack).
pub const MESSAGE_ONLY: &str = "%(message)s";

/// The `name.LEVELNAME: message` template used by basic configuration.
pub const BASIC_FORMAT: &str = "%(name)s.%(levelname)s: %(message)s";

/// Template serializing the whole record as one JSON object per line.
pub const TO_JSON: &str = "%O";

lazy_static! {
    static ref ANSI_RE: Regex = Regex::new("\x1b\\[[0-9;]*m").expect("literal pattern");
}

/// Remove ANSI color escapes from rendered output.
pub fn strip_ansi(text: &str) -> String {
    ANSI_RE.replace_all(text, "").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateKind {
    MessageOnly,
    Basic,
    Json,
    General,
}

fn classify(template: &str) -> TemplateKind {
    match template {
        MESSAGE_ONLY => TemplateKind::MessageOnly,
        BASIC_FORMAT => TemplateKind::Basic,
        TO_JSON => TemplateKind::Json,
        _ => TemplateKind::General,
    }
}

/// Renders records to text.
///
/// The three stock templates get dedicated fast paths; anything else runs
/// through the field-interpolation engine. Formatting never mutates the
/// record, so one record can pass through differently configured formatters
/// concurrently.
#[derive(Debug, Clone)]
pub struct Formatter {
    template: String,
    datefmt: String,
    colorize: bool,
    strip: bool,
    kind: TemplateKind,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(MESSAGE_ONLY)
    }
}

impl Formatter {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let kind = classify(&template);
        Self {
            template,
            datefmt: "%Y-%m-%d %H:%M:%S".to_string(),
            colorize: false,
            strip: false,
            kind,
        }
    }

    /// Override the `%(date)s` format, in chrono strftime syntax.
    #[must_use]
    pub fn with_datefmt(mut self, datefmt: impl Into<String>) -> Self {
        self.datefmt = datefmt.into();
        self
    }

    /// Color the level and logger name for terminal sinks.
    #[must_use]
    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    /// Strip any ANSI escapes from the output. Takes precedence over
    /// [`with_colorize`](Self::with_colorize).
    #[must_use]
    pub fn with_strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render one record.
    pub fn format(&self, record: &Record) -> String {
        let colorize = self.colorize && !self.strip;
        let mut out = match self.kind {
            TemplateKind::Json => json::stringify(&record.to_json()),
            TemplateKind::MessageOnly => record.message().to_string(),
            TemplateKind::Basic => {
                let name = self.painted_name(record, colorize);
                let levelname = self.painted_levelname(record, colorize);
                format!("{}.{}: {}", name, levelname, record.message())
            }
            TemplateKind::General => {
                printf::render(&self.template, &|field| self.field(record, field, colorize))
            }
        };

        if self.kind != TemplateKind::Json {
            if let Some(stack) = &record.stack {
                out.push_str(&stack.text);
            }
        }

        if self.strip {
            out = strip_ansi(&out);
        }
        out
    }

    fn field(&self, record: &Record, field: &str, colorize: bool) -> Option<String> {
        match field {
            "name" => Some(self.painted_name(record, colorize)),
            "levelname" => Some(self.painted_levelname(record, colorize)),
            "level" => Some(record.level.to_string()),
            "message" => Some(record.message().to_string()),
            "timestamp" => Some(
                record
                    .timestamp
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            ),
            "date" => Some(record.timestamp.format(&self.datefmt).to_string()),
            "pid" => Some(record.pid.to_string()),
            "host" => Some(record.host.clone()),
            "n" => Some("\n".to_string()),
            "v" => Some(record.v.to_string()),
            _ => None,
        }
    }

    fn painted_name(&self, record: &Record, colorize: bool) -> String {
        if colorize {
            record.name.bold().to_string()
        } else {
            record.name.clone()
        }
    }

    fn painted_levelname(&self, record: &Record, colorize: bool) -> String {
        if colorize {
            if let Some(color) = level::level_color(&record.levelname) {
                return color.paint(&record.levelname).to_string();
            }
        }
        record.levelname.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::{ERROR, INFO};
    use crate::core::record::Arg;

    fn record(name: &str, level: i32, message: &str) -> Record {
        Record::new(name, level, vec![Arg::from(message)])
    }

    #[test]
    fn test_message_only_default() {
        let formatter = Formatter::default();
        assert_eq!(formatter.format(&record("app", INFO, "hello")), "hello");
    }

    #[test]
    fn test_basic_format() {
        let formatter = Formatter::new(BASIC_FORMAT);
        assert_eq!(
            formatter.format(&record("app.db", INFO, "connected")),
            "app.db.INFO: connected"
        );
    }

    #[test]
    fn test_general_template_fields() {
        let formatter = Formatter::new("[%(level)d] %(name)s %(message)s");
        assert_eq!(
            formatter.format(&record("svc", ERROR, "down")),
            format!("[{}] svc down", ERROR)
        );
    }

    #[test]
    fn test_unknown_field_renders_undefined() {
        let formatter = Formatter::new("%(bogus)s!");
        assert_eq!(formatter.format(&record("app", INFO, "m")), "undefined!");
    }

    #[test]
    fn test_json_template() {
        let formatter = Formatter::new(TO_JSON);
        let out = formatter.format(&record("app", INFO, "hello"));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["name"], "app");
        assert_eq!(value["levelname"], "INFO");
    }

    #[test]
    fn test_date_field_uses_datefmt() {
        let formatter = Formatter::new("%(date)s").with_datefmt("%Y");
        let out = formatter.format(&record("app", INFO, "m"));
        assert_eq!(out.len(), 4);
        assert!(out.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_stack_appended_after_output() {
        let formatter = Formatter::new(BASIC_FORMAT);
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let rec = Record::new("app", ERROR, vec![Arg::error(&err)]);
        let out = formatter.format(&rec);
        assert!(out.starts_with("app.ERROR: boom\n"));
        assert!(out.contains("    at "));
    }

    #[test]
    fn test_colorize_wraps_levelname() {
        // force colors on regardless of tty detection; never unset, other
        // tests here either expect colors or strip them
        colored::control::set_override(true);
        let formatter = Formatter::new(BASIC_FORMAT).with_colorize(true);
        let out = formatter.format(&record("app", INFO, "m"));
        assert!(out.contains("\x1b["));
        assert_eq!(strip_ansi(&out), "app.INFO: m");
    }

    #[test]
    fn test_strip_overrides_colorize() {
        colored::control::set_override(true);
        let formatter = Formatter::new(BASIC_FORMAT)
            .with_colorize(true)
            .with_strip(true);
        let out = formatter.format(&record("app", INFO, "m"));
        assert_eq!(out, "app.INFO: m");
    }

    #[test]
    fn test_strip_ansi_helper() {
        assert_eq!(strip_ansi("\x1b[1;32mINFO\x1b[0m"), "INFO");
        assert_eq!(strip_ansi("plain"), "plain");
    }
}
