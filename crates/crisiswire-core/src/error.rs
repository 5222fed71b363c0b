//! Error types for crisiswire.

use thiserror::Error;

/// Result type alias using crisiswire's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for crisiswire operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP/network request failed before a response was received.
    #[error("Request error: {0}")]
    Request(String),

    /// The platform API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
