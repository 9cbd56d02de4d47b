//! Error types for Lectern

use thiserror::Error;

use crate::summarizer::SummarizerError;

/// Main error type for Lectern operations
#[derive(Error, Debug)]
pub enum LecternError {
    /// Configuration errors (invalid capacities, unreadable config files)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Summarizer construction errors
    #[error("Summarizer error: {0}")]
    Summarizer(#[from] SummarizerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl From<serde_json::Error> for LecternError {
    fn from(e: serde_json::Error) -> Self {
        LecternError::Serialization(e.to_string())
    }
}

/// Result type alias for Lectern operations
pub type Result<T> = std::result::Result<T, LecternError>;
