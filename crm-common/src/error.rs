//! Shared error type for the CRM services

use thiserror::Error;

/// Result alias over [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Failures shared by every CRM service crate
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite query or connection failure
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure (root folder creation, TOML write-back)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bootstrap TOML or a stored setting could not be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// A row the caller expected is gone
    #[error("Not found: {0}")]
    NotFound(String),

    /// A JSON column could not be encoded or decoded
    #[error("JSON column error: {0}")]
    Json(String),
}
