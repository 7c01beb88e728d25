//! Error types for pipeline operations.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` implementations.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Pipeline stage that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Natural language to SQL
    Synthesize,
    /// Read-only allow-list check
    Gate,
    /// Store execution
    Execute,
    /// Result to natural language
    Summarize,
}

impl Stage {
    /// Get stage name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synthesize => "synthesize",
            Self::Gate => "gate",
            Self::Execute => "execute",
            Self::Summarize => "summarize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for all pipeline operations.
///
/// Every request-level variant names the stage it came from so the
/// interactive surface can report which step failed.
#[derive(Error, Debug)]
pub enum FinqError {
    /// Text-completion service unreachable or returned an error
    #[error("Completion service error: {0}")]
    Completion(String),

    /// Synthesized query rejected by the safety gate (carries the query text)
    #[error("Unsafe query rejected, only read statements may run: {0}")]
    UnsafeQuery(String),

    /// Store rejected or failed to run a validated query
    #[error("Query execution failed: {0}")]
    StoreExecution(String),

    /// Second completion call (summary) failed
    #[error("Summarization failed: {0}")]
    Summarization(String),

    /// Question was empty after trimming
    #[error("Question must not be empty")]
    EmptyQuestion,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema creation or seed loading failed
    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl FinqError {
    /// Create a completion error with context.
    pub fn completion(msg: impl Into<String>) -> Self {
        Self::Completion(msg.into())
    }

    /// Create a store execution error with context.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreExecution(msg.into())
    }

    /// Pipeline stage this error belongs to.
    ///
    /// # Returns
    ///
    /// `None` for errors raised outside a request (configuration, bootstrap, I/O)
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Completion(_) | Self::EmptyQuestion => Some(Stage::Synthesize),
            Self::UnsafeQuery(_) => Some(Stage::Gate),
            Self::StoreExecution(_) => Some(Stage::Execute),
            Self::Summarization(_) => Some(Stage::Summarize),
            Self::Config(_) | Self::Bootstrap(_) | Self::Io(_) | Self::Json(_) | Self::Csv(_) => None,
        }
    }

    /// Check if the session can continue after this error.
    ///
    /// # Returns
    ///
    /// `true` for per-question failures, `false` for setup failures
    pub fn is_recoverable(&self) -> bool {
        self.stage().is_some()
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FinqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_stage_mapping() {
        assert_eq!(FinqError::completion("timeout").stage(), Some(Stage::Synthesize));
        assert_eq!(
            FinqError::UnsafeQuery("DROP TABLE Companies".to_string()).stage(),
            Some(Stage::Gate)
        );
        assert_eq!(FinqError::store("no such column").stage(), Some(Stage::Execute));
        assert_eq!(
            FinqError::Summarization("rate limited".to_string()).stage(),
            Some(Stage::Summarize)
        );
        assert_eq!(FinqError::Config("missing key".to_string()).stage(), None);
    }

    #[test]
    fn test_error_recoverable() {
        assert!(FinqError::store("syntax error").is_recoverable());
        assert!(!FinqError::Bootstrap("disk full".to_string()).is_recoverable());
    }

    #[test]
    fn test_unsafe_query_message_includes_query() {
        let err = FinqError::UnsafeQuery("DELETE FROM Companies".to_string());
        assert!(err.to_string().contains("DELETE FROM Companies"));
    }
}
