//! Domain-level error taxonomy for Colloquy.

use crate::domain::category::Category;

/// A single evaluator task could not produce a usable evaluation.
///
/// Covers a missing adapter, a failed or timed-out capability call, and a
/// response that fails schema validation. Always recovered into a
/// placeholder report by the orchestrator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("evaluation of {category} failed: {cause}")]
pub struct EvaluationError {
    pub category: Category,
    pub cause: String,
}

impl EvaluationError {
    pub fn new(category: Category, cause: impl Into<String>) -> Self {
        Self {
            category,
            cause: cause.into(),
        }
    }
}

/// Colloquy domain errors.
#[derive(Debug, thiserror::Error)]
pub enum ColloquyError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("evaluation of {category} failed: {cause}")]
    Evaluation { category: Category, cause: String },

    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("invalid rubric: {0}")]
    InvalidRubric(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("work queue closed")]
    QueueClosed,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] colloquy_store::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EvaluationError> for ColloquyError {
    fn from(err: EvaluationError) -> Self {
        ColloquyError::Evaluation {
            category: err.category,
            cause: err.cause,
        }
    }
}

/// Result type for Colloquy domain operations.
pub type Result<T> = std::result::Result<T, ColloquyError>;
