//! Record filters and the filter chain shared by loggers and handlers

use super::error::{LogError, Result};
use super::record::Record;
use parking_lot::RwLock;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// A predicate over records.
///
/// Name filters match a dotted namespace prefix on whole segments: filter
/// `"app.db"` accepts `app.db` and `app.db.pool` but not `app.database`.
/// Pattern filters test the rendered message, and predicate filters run an
/// arbitrary closure.
pub enum Filter {
    Name(String),
    Pattern(Regex),
    Predicate(Box<dyn Fn(&Record) -> bool + Send + Sync>),
}

impl Filter {
    pub fn name(prefix: impl Into<String>) -> Self {
        Filter::Name(prefix.into())
    }

    pub fn pattern(regex: Regex) -> Self {
        Filter::Pattern(regex)
    }

    /// Compile a message pattern, failing loudly on an invalid expression.
    pub fn pattern_str(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| LogError::config("Filter", format!("invalid pattern: {}", e)))?;
        Ok(Filter::Pattern(regex))
    }

    pub fn predicate(f: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Filter::Predicate(Box::new(f))
    }

    /// Whether the record passes this filter.
    pub fn accepts(&self, record: &Record) -> bool {
        match self {
            Filter::Name(prefix) => {
                if prefix.is_empty() || record.name == *prefix {
                    return true;
                }
                record
                    .name
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
            }
            Filter::Pattern(regex) => regex.is_match(record.message()),
            Filter::Predicate(f) => f(record),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Name(prefix) => f.debug_tuple("Name").field(prefix).finish(),
            Filter::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// An AND-chain of filters.
///
/// Embedded by both loggers and handler cores. The empty chain accepts
/// everything without touching the record, keeping the common case free.
#[derive(Debug, Default)]
pub struct Filterer {
    filters: RwLock<Vec<Arc<Filter>>>,
}

impl Filterer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&self, filter: Arc<Filter>) {
        self.filters.write().push(filter);
    }

    /// Remove a previously added filter, matched by identity.
    pub fn remove_filter(&self, filter: &Arc<Filter>) {
        self.filters.write().retain(|f| !Arc::ptr_eq(f, filter));
    }

    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }

    /// Whether the record passes every filter in the chain.
    pub fn accepts(&self, record: &Record) -> bool {
        let filters = self.filters.read();
        if filters.is_empty() {
            return true;
        }
        filters.iter().all(|f| f.accepts(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::INFO;
    use crate::core::record::Arg;

    fn record(name: &str, message: &str) -> Record {
        Record::new(name, INFO, vec![Arg::from(message)])
    }

    #[test]
    fn test_name_filter_segment_boundary() {
        let filter = Filter::name("app.db");
        assert!(filter.accepts(&record("app.db", "m")));
        assert!(filter.accepts(&record("app.db.pool", "m")));
        assert!(!filter.accepts(&record("app.database", "m")));
        assert!(!filter.accepts(&record("app", "m")));
    }

    #[test]
    fn test_empty_name_filter_accepts_all() {
        let filter = Filter::name("");
        assert!(filter.accepts(&record("anything", "m")));
    }

    #[test]
    fn test_pattern_filter_matches_message() {
        let filter = Filter::pattern_str("user \\d+").unwrap();
        assert!(filter.accepts(&record("app", "user 42 logged in")));
        assert!(!filter.accepts(&record("app", "anonymous visit")));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(Filter::pattern_str("(unclosed").is_err());
    }

    #[test]
    fn test_predicate_filter() {
        let filter = Filter::predicate(|r| r.level >= INFO);
        assert!(filter.accepts(&record("app", "m")));
    }

    #[test]
    fn test_filterer_and_semantics() {
        let chain = Filterer::new();
        assert!(chain.accepts(&record("app.db", "user 7")));

        chain.add_filter(Arc::new(Filter::name("app")));
        chain.add_filter(Arc::new(Filter::pattern_str("user").unwrap()));
        assert!(chain.accepts(&record("app.db", "user 7")));
        assert!(!chain.accepts(&record("app.db", "system event")));
        assert!(!chain.accepts(&record("web", "user 7")));
    }

    #[test]
    fn test_filterer_remove() {
        let chain = Filterer::new();
        let filter = Arc::new(Filter::name("app"));
        chain.add_filter(Arc::clone(&filter));
        assert!(!chain.accepts(&record("web", "m")));

        chain.remove_filter(&filter);
        assert!(chain.accepts(&record("web", "m")));
        assert!(chain.is_empty());
    }
}
