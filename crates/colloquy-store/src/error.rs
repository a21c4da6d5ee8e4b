//! Error types for colloquy-store

use thiserror::Error;

/// Errors that can occur in the feedback persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// Record with the given id does not exist
    #[error("feedback record not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// Record could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking storage task panicked or was cancelled
    #[error("storage task failed: {0}")]
    Task(String),
}
