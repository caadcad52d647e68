//! Error handling for Solfa
//!
//! Content-unavailable and contract-violation errors propagate to the hosting
//! adapter; unrecognized player input is absorbed inside the levels and is
//! never represented here.

use thiserror::Error;

/// Result type alias for Solfa operations
pub type Result<T> = std::result::Result<T, SolfaError>;

/// Main error type for Solfa operations
#[derive(Error, Debug)]
pub enum SolfaError {
    // Content Errors
    #[error("No content available: {what}")]
    ContentUnavailable { what: String },

    // Contract Violations
    #[error("No question is currently posed on level \"{level}\"")]
    NoSecret { level: &'static str },

    #[error("Engine mode is not set")]
    ModeNotSet,

    // Loader Errors
    #[error("Failed to load data file: {path}")]
    DataLoad {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid note notation: {token}")]
    ParseNote { token: String },

    #[error("Invalid content row at line {line}: {reason}")]
    ParseRow { line: usize, reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SolfaError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SolfaError::ContentUnavailable { .. } => "CONTENT_UNAVAILABLE",
            SolfaError::NoSecret { .. } => "NO_SECRET",
            SolfaError::ModeNotSet => "MODE_NOT_SET",
            SolfaError::DataLoad { .. } => "DATA_LOAD",
            SolfaError::ParseNote { .. } => "PARSE_NOTE",
            SolfaError::ParseRow { .. } => "PARSE_ROW",
            SolfaError::Io(_) => "IO_ERROR",
            SolfaError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// True for errors that indicate a caller-side programming mistake
    /// rather than a data or environment problem.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, SolfaError::NoSecret { .. } | SolfaError::ModeNotSet)
    }
}
