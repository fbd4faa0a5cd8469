//! Error types for herald.

use thiserror::Error;

/// Result type alias using herald's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for herald operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP/network request failed before a response was read
    #[error("Request error: {0}")]
    Request(String),

    /// Backend answered but refused the operation (`success: false` or non-2xx)
    #[error("Rejected by server: {0}")]
    Rejected(String),

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

    /// Push transport sent something the codec cannot interpret
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Push connection could not be established or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure happened before the backend could answer.
    ///
    /// Transport failures leave client state untouched; rejections are shown
    /// to the operator with the backend's message.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Request(_) | Error::Connection(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Serialization(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}
