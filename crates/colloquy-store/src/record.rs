//! The persisted form of one finished workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Unique identifier for a stored feedback record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeedbackId(pub Uuid);

impl FeedbackId {
    /// Generate a new random id
    pub fn new() -> Self {
        FeedbackId(Uuid::new_v4())
    }
}

impl Default for FeedbackId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SHA-256 hex digest of the analyzed input text.
///
/// Records keep the digest rather than the transcript itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputDigest(String);

impl InputDigest {
    /// Hex SHA-256 of `text`.
    pub fn of_text(text: &str) -> Self {
        InputDigest(hex::encode(Sha256::digest(text.as_bytes())))
    }

    /// Full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for InputDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A finished workflow result as stored for later retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Record id, assigned at creation.
    pub id: FeedbackId,
    /// When the run finished; orders `most_recent`.
    pub created_at: DateTime<Utc>,
    /// Digest of the analyzed transcript.
    pub input_digest: InputDigest,
    /// Narrative summary of the run.
    pub summary: String,
    /// Aggregate score in [0, 1].
    pub total_score: f64,
    /// Per-category reports, in report order.
    pub reports: serde_json::Value,
    /// Wall-clock processing time of the workflow.
    pub elapsed_ms: u64,
}

impl FeedbackRecord {
    /// Fresh record stamped now, storing only the digest of `input_text`.
    pub fn new(
        input_text: &str,
        summary: impl Into<String>,
        total_score: f64,
        reports: serde_json::Value,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            id: FeedbackId::new(),
            created_at: Utc::now(),
            input_digest: InputDigest::of_text(input_text),
            summary: summary.into(),
            total_score,
            reports,
            elapsed_ms,
        }
    }

    /// Ordering key used to pick the most recent record.
    pub(crate) fn recency_key(&self) -> (DateTime<Utc>, FeedbackId) {
        (self.created_at, self.id)
    }
}
