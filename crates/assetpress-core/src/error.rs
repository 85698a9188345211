//! Error types for assetpress.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Client input errors
    #[error("Invalid payload: {0}")]
    Payload(String),

    #[error("Bad file: {0}")]
    BadFile(String),

    // Backend errors
    #[error("Compression failed: {0}")]
    Compression(String),

    // Infrastructure errors
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error was caused by the request itself (forged or
    /// malformed token, unknown file) rather than by the server.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Error::Payload(_) | Error::BadFile(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
