//! Error types for leanline-core

use thiserror::Error;

/// Main error type for the leanline-core library
///
/// The analytics layer never produces these; they come from storage,
/// configuration and input parsing.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A user-supplied value could not be parsed
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// User profile not found
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Reading not found
    #[error("reading not found: {0}")]
    ReadingNotFound(String),
}

impl Error {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for leanline-core
pub type Result<T> = std::result::Result<T, Error>;
