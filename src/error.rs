//! Error handling for debugchart-rs
//!
//! The data path (fetching and reshaping variable values) never returns these
//! errors to the user; they are logged and degrade to empty charts. Typed
//! errors are only surfaced at the edges: connecting to an adapter, loading or
//! saving configuration, and channel shutdown.

use thiserror::Error;

/// Main error type for debugchart-rs operations
#[derive(Error, Debug)]
pub enum DebugChartError {
    /// No session, or the session went away mid-request
    #[error("Session error: {0}")]
    Session(String),

    /// The adapter answered a request with `success: false`
    #[error("Request '{command}' failed: {message}")]
    Protocol { command: String, message: String },

    /// Errors establishing the adapter connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// Timeout waiting for an adapter response
    #[error("Timeout: {0}")]
    Timeout(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DebugChartError>,
    },
}

impl DebugChartError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DebugChartError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for DebugChartError {
    fn from(err: serde_json::Error) -> Self {
        DebugChartError::Serialization(err.to_string())
    }
}

/// Result type alias for debugchart-rs operations
pub type Result<T> = std::result::Result<T, DebugChartError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DebugChartError::Session("no active session".to_string());
        assert_eq!(err.to_string(), "Session error: no active session");
    }

    #[test]
    fn test_protocol_error_display() {
        let err = DebugChartError::Protocol {
            command: "scopes".to_string(),
            message: "invalid frame".to_string(),
        };
        assert_eq!(err.to_string(), "Request 'scopes' failed: invalid frame");
    }

    #[test]
    fn test_error_with_context() {
        let err: Result<()> = Err(DebugChartError::Connection("refused".to_string()));
        let with_ctx = err.context("Failed to attach").unwrap_err();
        assert!(with_ctx.to_string().contains("Failed to attach"));
        assert!(with_ctx.to_string().contains("refused"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DebugChartError = json_err.into();
        assert!(matches!(err, DebugChartError::Serialization(_)));
    }
}
