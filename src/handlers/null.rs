//! Handler that discards everything

use crate::core::completion::Completion;
use crate::core::handler::{Handler, HandlerCore};
use crate::core::record::Record;
use std::sync::Arc;

/// Accepts and discards every record. Useful to silence a subtree while
/// keeping propagation semantics intact, or as a placeholder in tests.
#[derive(Default)]
pub struct NullHandler {
    core: HandlerCore,
}

impl NullHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Handler for NullHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, _record: &Arc<Record>) -> Completion {
        Completion::done()
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::INFO;
    use crate::core::record::Arg;

    #[test]
    fn test_always_succeeds() {
        let handler = NullHandler::new();
        let record = Arc::new(Record::new("app", INFO, vec![Arg::from("gone")]));
        assert!(handler.handle(&record).wait().is_ok());
    }
}
