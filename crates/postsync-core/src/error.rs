//! Error types for postsync-core

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using postsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in postsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Post not found for the given local id
    #[error("Post not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the record's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote store failure that could not be recovered locally
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}
