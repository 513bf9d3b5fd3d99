//! Convenience macros for building argument lists and logging

/// Build a `Vec<Arg>` from mixed values, converting each through
/// `Arg::from`.
///
/// ```
/// use hierlog::args;
///
/// let args = args!["user %s has %d items", "ada", 3];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::Arg::from($value)),+]
    };
}

/// Log at a dynamically chosen level.
///
/// ```no_run
/// use hierlog::{log, Registry, INFO};
///
/// let registry = Registry::new();
/// let logger = registry.get_logger("app");
/// log!(logger, INFO, "listening on %d", 8080);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($value:expr),+ $(,)?) => {
        $logger.log($level, $crate::args![$($value),+])
    };
}

/// Log with a call-stack snapshot attached.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($value:expr),+ $(,)?) => {
        $logger.trace($crate::args![$($value),+])
    };
}

/// Log at VERBOSE.
#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($value:expr),+ $(,)?) => {
        $logger.verbose($crate::args![$($value),+])
    };
}

/// Log at DEBUG.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($value:expr),+ $(,)?) => {
        $logger.debug($crate::args![$($value),+])
    };
}

/// Log at INFO.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($value:expr),+ $(,)?) => {
        $logger.info($crate::args![$($value),+])
    };
}

/// Log at WARN.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($value:expr),+ $(,)?) => {
        $logger.warn($crate::args![$($value),+])
    };
}

/// Log at ERROR.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($value:expr),+ $(,)?) => {
        $logger.error($crate::args![$($value),+])
    };
}

/// Log at CRITICAL.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($value:expr),+ $(,)?) => {
        $logger.critical($crate::args![$($value),+])
    };
}

#[cfg(test)]
mod tests {
    use crate::core::level::{ALL, INFO};
    use crate::core::Registry;

    #[test]
    fn test_args_macro_converts_values() {
        let args = args!["count: %d", 7, true];
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].as_str(), Some("count: %d"));
        assert_eq!(args[1].as_number(), Some(7.0));
    }

    #[test]
    fn test_args_macro_empty() {
        let args = args![];
        assert!(args.is_empty());
    }

    #[test]
    fn test_log_macro_dispatches() {
        let registry = Registry::new();
        let logger = registry.get_logger("app");
        logger.set_level(ALL).unwrap();
        assert!(log!(logger, INFO, "port %d", 8080).wait().is_ok());
        assert!(info!(logger, "plain").wait().is_ok());
        assert!(warn!(logger, "%s problems", 99).wait().is_ok());
    }
}
