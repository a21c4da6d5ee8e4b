//! In-memory fakes for storage traits (testing only)

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::{FeedbackId, FeedbackRecord};
use crate::storage_traits::*;

/// In-memory feedback store backed by a `HashMap<FeedbackId, FeedbackRecord>`.
#[derive(Debug, Default)]
pub struct MemoryFeedbackStore {
    records: Mutex<HashMap<FeedbackId, FeedbackRecord>>,
}

impl MemoryFeedbackStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Whether no record has been saved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FeedbackStore for MemoryFeedbackStore {
    async fn save(&self, record: &FeedbackRecord) -> StorageResult<()> {
        let mut records = self.records.lock().unwrap();
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: &FeedbackId) -> StorageResult<FeedbackRecord> {
        let records = self.records.lock().unwrap();
        records
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })
    }

    async fn most_recent(&self) -> StorageResult<Option<FeedbackRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .max_by_key(|r| r.recency_key())
            .cloned())
    }
}
