//! Error types for grove-core

use thiserror::Error;

/// Result type alias using grove-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in grove-core operations
///
/// Pipeline-specific failures (tag reads, validation, sink uploads) have
/// their own enums next to the code that produces them; this type covers the
/// storage and serialization plumbing underneath the queue.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Queue entry not found
    #[error("Queue entry not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
