//! Storage trait definitions for Colloquy
//!
//! `FeedbackStore` persists finished workflow results and answers the
//! "most recent result" query. The trait is async and backend-agnostic;
//! an in-memory fake lives in the `fakes` module.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::{FeedbackId, FeedbackRecord};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Persistence for finished workflow results.
///
/// Guarantees:
/// - `save(record)` followed by `get(record.id)` returns an equal record.
/// - `most_recent()` returns the record with the latest `created_at`
///   (ties broken by id), or `None` when the store is empty.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Persist a record. Saving the same id twice overwrites.
    async fn save(&self, record: &FeedbackRecord) -> StorageResult<()>;

    /// Fetch a record by id. Returns `StorageError::NotFound` if absent.
    async fn get(&self, id: &FeedbackId) -> StorageResult<FeedbackRecord>;

    /// The newest stored record, if any.
    async fn most_recent(&self) -> StorageResult<Option<FeedbackRecord>>;
}
