use std::io;
use thiserror::Error;

use crate::persistence::PersistenceError;

/// Crate-wide error type, consolidating all possible errors into a single enum.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Invalid call parameters at the library boundary (blank session key, oversized input).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The universal fallback template is missing from the template library.
    /// Raised while building the library, never per request.
    #[error("Template configuration error: {0}")]
    TemplateMissing(String),

    /// Represents configuration-related errors (e.g., unparseable environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Represents data validation errors (e.g., out-of-range settings or preferences).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Errors raised by the memory persistence layer.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Represents errors originating from the database, typically from `sqlx`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for AssistantError {
    fn from(err: serde_json::Error) -> Self {
        AssistantError::Validation(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AssistantError {
    fn from(err: validator::ValidationErrors) -> Self {
        AssistantError::Validation(format!("Validation errors: {}", err))
    }
}

impl From<regex::Error> for AssistantError {
    fn from(err: regex::Error) -> Self {
        AssistantError::Config(format!("Invalid pattern: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
