//! Error handling for the Scribe system

use thiserror::Error;

/// Result type alias for Scribe operations
pub type Result<T> = std::result::Result<T, ScribeError>;

/// Main error type for the Scribe system
#[derive(Error, Debug)]
pub enum ScribeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Event bus errors
    #[error("Event bus error: {0}")]
    EventBus(String),

    /// Auto-save submission errors (rejected response or transport fault)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Editor session errors
    #[error("Session error: {0}")]
    Session(String),

    /// Fullscreen presentation errors
    #[error("Presentation error: {0}")]
    Presentation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScribeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new event bus error
    pub fn event_bus<S: Into<String>>(msg: S) -> Self {
        Self::EventBus(msg.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new session error
    pub fn session<S: Into<String>>(msg: S) -> Self {
        Self::Session(msg.into())
    }

    /// Create a new presentation error
    pub fn presentation<S: Into<String>>(msg: S) -> Self {
        Self::Presentation(msg.into())
    }

    /// Check if this is a recoverable error
    ///
    /// Transport errors are always recoverable: the next auto-save tick retries.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ScribeError::Config(_) => false,
            ScribeError::EventBus(_) => true,
            ScribeError::Transport(_) => true,
            ScribeError::Session(_) => false,
            ScribeError::Presentation(_) => true,
            ScribeError::Io(_) => true,
            ScribeError::Json(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ScribeError::Config(_) => ErrorSeverity::High,
            ScribeError::EventBus(_) => ErrorSeverity::Medium,
            ScribeError::Transport(_) => ErrorSeverity::Low,
            ScribeError::Session(_) => ErrorSeverity::High,
            ScribeError::Presentation(_) => ErrorSeverity::Low,
            ScribeError::Io(_) => ErrorSeverity::Medium,
            ScribeError::Json(_) => ErrorSeverity::Low,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_recoverable() {
        let err = ScribeError::transport("connection refused");
        assert!(err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn test_config_errors_are_fatal() {
        let err = ScribeError::config("interval must be positive");
        assert!(!err.is_recoverable());
        assert_eq!(err.severity().to_string(), "HIGH");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ScribeError = io.into();
        assert!(matches!(err, ScribeError::Io(_)));
    }
}
