//! Structured error types for the Concordia workspace.

use thiserror::Error;

/// Unified error type for all Concordia operations.
#[derive(Debug, Error)]
pub enum ConcordiaError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed input data)
    #[error("parse error: {0}")]
    Parse(String),

    /// An input table lacks one or more required semantic columns.
    ///
    /// Fatal for the file; no partial processing happens.
    #[error("{file}: missing required columns: {}", .columns.join(", "))]
    MissingColumns { file: String, columns: Vec<String> },

    /// Not enough data to run a stage. Non-fatal: the stage is aborted and
    /// nothing is written, but the caller may carry on.
    #[error("{stage}: {message}")]
    InsufficientData { stage: String, message: String },

    /// Invalid input (bad arguments, unknown configuration values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration file could not be loaded
    #[error("config error: {0}")]
    Config(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

impl ConcordiaError {
    /// Shorthand for an [`ConcordiaError::InsufficientData`] error.
    pub fn insufficient(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InsufficientData {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Whether the error is a recoverable "not enough data" condition rather
    /// than a broken input or programming error.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

/// Convenience alias used throughout the Concordia workspace.
pub type Result<T> = std::result::Result<T, ConcordiaError>;
