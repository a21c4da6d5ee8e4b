//! Colloquy Core Library
//!
//! Routes a conversation transcript to per-category evaluators, runs them
//! concurrently, scores each against a weighted rubric and synthesizes a
//! single [`WorkflowResult`].

pub mod capability;
pub mod config;
pub mod domain;
pub mod evaluation;
pub mod fakes;
pub mod metrics;
pub mod obs;
pub mod prompts;
pub mod queue;
pub mod rubric;
pub mod scorer;
pub mod telemetry;
pub mod workflow;

pub use capability::{
    CapabilityError, CapabilityRequest, FieldKind, HttpCapability, Purpose, ResponseSchema,
    TextCapability,
};

pub use config::{CapabilityConfig, WorkflowConfig};

pub use domain::{
    Category, ColloquyError, Commentary, EvaluationError, RawEvaluation, Report, Result,
    SubScores, Task, WorkflowResult,
};

pub use evaluation::{CapabilityEvaluator, EvaluatorPort, Orchestrator, Router, Synthesizer};

pub use queue::{WorkItem, WorkQueue};

pub use rubric::{CategoryRubric, Characteristic, Orientation, RubricTable, RubricWeights};

pub use workflow::{TimedResult, Workflow};

/// Colloquy version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
