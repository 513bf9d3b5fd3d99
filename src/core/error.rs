//! Error types for the logging pipeline

pub type Result<T> = std::result::Result<T, LogError>;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// A level value that the active level table cannot resolve
    #[error("Cannot resolve level from value: '{value}'")]
    InvalidLevel { value: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// IO error raised by a handler sink
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Handler emission error with sink context
    #[error("Handler '{handler}' failed to emit: {message}")]
    EmitFailed { handler: String, message: String },

    /// A handler panicked inside emit
    #[error("Handler panicked during emit: {0}")]
    HandlerPanic(String),

    /// A deferred emission did not finish within its timeout
    #[error("Emit timed out after {0:?}")]
    EmitTimeout(std::time::Duration),

    /// A deferred emission was abandoned before resolving
    #[error("Emit completion was abandoned before resolving")]
    Incomplete,

    /// Multiple dispatch branches of one log call failed
    #[error("{} log dispatches failed: {}", .0.len(), .0.first().map(|e| e.to_string()).unwrap_or_default())]
    Aggregate(Vec<LogError>),

    /// File handler error with path
    #[error("File handler error for '{path}': {message}")]
    FileHandlerError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LogError {
    /// Create an invalid-level error from any displayable value
    pub fn invalid_level(value: impl std::fmt::Display) -> Self {
        LogError::InvalidLevel {
            value: value.to_string(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LogError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an emit failure with handler context
    pub fn emit(handler: impl Into<String>, message: impl Into<String>) -> Self {
        LogError::EmitFailed {
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Create a file handler error
    pub fn file_handler(path: impl Into<String>, message: impl Into<String>) -> Self {
        LogError::FileHandlerError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LogError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LogError::Other(msg.into())
    }

    /// Flatten a list of failures into a single error.
    ///
    /// One failure is returned as-is; several become an [`LogError::Aggregate`]
    /// carrying all of them, first failure leading.
    pub fn aggregate(mut errors: Vec<LogError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => Some(errors.remove(0)),
            _ => Some(LogError::Aggregate(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LogError::invalid_level("chartreuse");
        assert!(matches!(err, LogError::InvalidLevel { .. }));

        let err = LogError::config("Filter", "invalid pattern");
        assert!(matches!(err, LogError::InvalidConfiguration { .. }));

        let err = LogError::file_handler("/var/log/app.log", "permission denied");
        assert!(matches!(err, LogError::FileHandlerError { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LogError::invalid_level("nope");
        assert_eq!(err.to_string(), "Cannot resolve level from value: 'nope'");

        let err = LogError::file_rotation("/var/log/app.log", "disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for '/var/log/app.log': disk full"
        );
    }

    #[test]
    fn test_aggregate_flattening() {
        assert!(LogError::aggregate(vec![]).is_none());

        let single = LogError::aggregate(vec![LogError::other("one")]).unwrap();
        assert!(matches!(single, LogError::Other(_)));

        let many =
            LogError::aggregate(vec![LogError::other("first"), LogError::other("second")])
                .unwrap();
        match many {
            LogError::Aggregate(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].to_string(), "first");
            }
            other => panic!("expected Aggregate, got {}", other),
        }
    }
}
