//! Level constants and the process-wide level table
//!
//! Levels are plain numbers with a registered name table. The table is
//! process-wide mutable state: [`set_levels`] replaces it wholesale, which
//! atomically retargets every name-based lookup in the process, including the
//! per-level convenience methods on `Logger` (they resolve their name through
//! the active table on each call rather than being rewritten at runtime).

use super::error::{LogError, Result};
use colored::{ColoredString, Colorize};
use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Accept-everything sentinel
pub const ALL: i32 = 0;
pub const TRACE: i32 = 10;
pub const VERBOSE: i32 = 20;
pub const DEBUG: i32 = 30;
pub const INFO: i32 = 40;
pub const WARN: i32 = 50;
pub const ERROR: i32 = 60;
pub const CRITICAL: i32 = 70;
/// Accept-nothing sentinel
pub const NONE: i32 = i32::MAX;

/// The five console methods every level table must map to defined levels
pub const CONSOLE_METHODS: [&str; 5] = ["trace", "log", "info", "warn", "error"];

/// A level reference: a number, a numeric string, or a case-insensitive name
#[derive(Debug, Clone)]
pub enum LevelSpec {
    Num(i32),
    Name(String),
}

impl From<i32> for LevelSpec {
    fn from(n: i32) -> Self {
        LevelSpec::Num(n)
    }
}

impl From<&str> for LevelSpec {
    fn from(s: &str) -> Self {
        LevelSpec::Name(s.to_string())
    }
}

impl From<String> for LevelSpec {
    fn from(s: String) -> Self {
        LevelSpec::Name(s)
    }
}

impl std::fmt::Display for LevelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelSpec::Num(n) => write!(f, "{}", n),
            LevelSpec::Name(s) => write!(f, "{}", s),
        }
    }
}

/// Terminal style attached to a level name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelColor {
    BlueBackground,
    Magenta,
    Cyan,
    Green,
    Yellow,
    Red,
    RedBackground,
}

impl LevelColor {
    /// Apply this style to a string, bold like the rest of the palette
    pub fn paint(&self, s: &str) -> ColoredString {
        match self {
            LevelColor::BlueBackground => s.bold().on_blue(),
            LevelColor::Magenta => s.bold().magenta(),
            LevelColor::Cyan => s.bold().cyan(),
            LevelColor::Green => s.bold().green(),
            LevelColor::Yellow => s.bold().yellow(),
            LevelColor::Red => s.bold().red(),
            LevelColor::RedBackground => s.bold().on_red(),
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "blue_background" => Some(LevelColor::BlueBackground),
            "magenta" => Some(LevelColor::Magenta),
            "cyan" => Some(LevelColor::Cyan),
            "green" => Some(LevelColor::Green),
            "yellow" => Some(LevelColor::Yellow),
            "red" => Some(LevelColor::Red),
            "red_background" => Some(LevelColor::RedBackground),
            _ => None,
        }
    }
}

/// One level definition inside a [`LevelsConfig`].
///
/// `level` is kept as raw JSON so a non-numeric value is a runtime
/// configuration error rather than a type error, matching the validation
/// contract of the table-replacement operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDef {
    pub level: serde_json::Value,
    #[serde(default)]
    pub color: Option<String>,
}

impl LevelDef {
    pub fn new(level: i32) -> Self {
        Self {
            level: serde_json::Value::from(level),
            color: None,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }
}

/// Full replacement configuration for the level table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelsConfig {
    pub levels: BTreeMap<String, LevelDef>,
    /// Maps the five canonical console methods to level names
    pub console: BTreeMap<String, String>,
    /// Alternative names resolving to a primary level, e.g. WARNING -> WARN
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

struct LevelTable {
    names: HashMap<String, i32>,
    numbers: HashMap<i32, String>,
    colors: HashMap<String, LevelColor>,
    console: HashMap<String, String>,
}

impl LevelTable {
    fn default_table() -> Self {
        let defs: [(&str, i32, Option<LevelColor>); 9] = [
            ("ALL", ALL, None),
            ("TRACE", TRACE, Some(LevelColor::BlueBackground)),
            ("VERBOSE", VERBOSE, Some(LevelColor::Magenta)),
            ("DEBUG", DEBUG, Some(LevelColor::Cyan)),
            ("INFO", INFO, Some(LevelColor::Green)),
            ("WARN", WARN, Some(LevelColor::Yellow)),
            ("ERROR", ERROR, Some(LevelColor::Red)),
            ("CRITICAL", CRITICAL, Some(LevelColor::RedBackground)),
            ("NONE", NONE, None),
        ];

        let mut names = HashMap::new();
        let mut numbers = HashMap::new();
        let mut colors = HashMap::new();
        for (name, number, color) in defs {
            names.insert(name.to_string(), number);
            numbers.insert(number, name.to_string());
            if let Some(c) = color {
                colors.insert(name.to_string(), c);
            }
        }
        names.insert("WARNING".to_string(), WARN);
        names.insert("FATAL".to_string(), CRITICAL);

        let console = [
            ("trace", "TRACE"),
            ("log", "DEBUG"),
            ("info", "INFO"),
            ("warn", "WARN"),
            ("error", "ERROR"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            names,
            numbers,
            colors,
            console,
        }
    }
}

lazy_static! {
    static ref TABLE: RwLock<LevelTable> = RwLock::new(LevelTable::default_table());
}

/// Resolve a level reference to its number.
///
/// Accepts a number (passed through), a numeric string, or a case-insensitive
/// level name. Returns `None` for anything the active table cannot resolve.
pub fn get_level(spec: impl Into<LevelSpec>) -> Option<i32> {
    match spec.into() {
        LevelSpec::Num(n) => Some(n),
        LevelSpec::Name(s) => {
            if let Ok(n) = s.trim().parse::<i32>() {
                return Some(n);
            }
            TABLE.read().names.get(&s.to_uppercase()).copied()
        }
    }
}

/// Inverse of [`get_level`] for primary (non-alias) names
pub fn get_level_name(number: i32) -> Option<String> {
    TABLE.read().numbers.get(&number).cloned()
}

/// Color registered for a level name, if any
pub fn level_color(name: &str) -> Option<LevelColor> {
    TABLE.read().colors.get(name).copied()
}

/// Console-method mapping of the active table (`trace/log/info/warn/error`)
pub fn console_level(method: &str) -> Option<i32> {
    let table = TABLE.read();
    let name = table.console.get(method)?;
    table.names.get(name).copied()
}

/// Atomically replace the entire level table.
///
/// Every validation runs before any mutation; on error the previous table is
/// left fully intact:
/// - each level value must be numeric and fit in `i32`,
/// - level numbers must be unique,
/// - the `console` map must cover all of `trace, log, info, warn, error` and
///   reference defined level names,
/// - every alias must target a defined level name.
pub fn set_levels(config: LevelsConfig) -> Result<()> {
    let mut names = HashMap::new();
    let mut numbers = HashMap::new();
    let mut colors = HashMap::new();

    for (name, def) in &config.levels {
        let upper = name.to_uppercase();
        let number = def
            .level
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| {
                LogError::config(
                    "levels",
                    format!("level '{}' has a non-numeric value: {}", name, def.level),
                )
            })?;
        if numbers.contains_key(&number) {
            return Err(LogError::config(
                "levels",
                format!("duplicate level number {} for '{}'", number, name),
            ));
        }
        names.insert(upper.clone(), number);
        numbers.insert(number, upper.clone());
        if let Some(color) = &def.color {
            let parsed = LevelColor::from_name(color).ok_or_else(|| {
                LogError::config(
                    "levels",
                    format!("unknown color '{}' for level '{}'", color, name),
                )
            })?;
            colors.insert(upper, parsed);
        }
    }

    let mut console = HashMap::new();
    for method in CONSOLE_METHODS {
        let target = config.console.get(method).ok_or_else(|| {
            LogError::config(
                "levels",
                format!("console map is missing the '{}' method", method),
            )
        })?;
        let upper = target.to_uppercase();
        if !names.contains_key(&upper) {
            return Err(LogError::config(
                "levels",
                format!("console method '{}' maps to undefined level '{}'", method, target),
            ));
        }
        console.insert(method.to_string(), upper);
    }

    for (alias, target) in &config.aliases {
        let number = *names.get(&target.to_uppercase()).ok_or_else(|| {
            LogError::config(
                "levels",
                format!("alias '{}' targets undefined level '{}'", alias, target),
            )
        })?;
        names.insert(alias.to_uppercase(), number);
    }

    *TABLE.write() = LevelTable {
        names,
        numbers,
        colors,
        console,
    };
    Ok(())
}

/// Restore the built-in level table. Intended for test isolation.
pub fn reset_levels() {
    *TABLE.write() = LevelTable::default_table();
}
