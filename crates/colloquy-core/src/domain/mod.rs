//! Domain models for Colloquy.
//!
//! Canonical definitions for the core entities:
//! - `Category`: the closed set of evaluation dimensions
//! - `Task`: one category paired with the text to evaluate
//! - `RawEvaluation` / `Report`: an evaluator's output before and after scoring
//! - `WorkflowResult`: the terminal artifact of one invocation

pub mod category;
pub mod error;
pub mod report;

// Re-export main types and errors
pub use category::Category;
pub use error::{ColloquyError, EvaluationError, Result};
pub use report::{
    Commentary, RawEvaluation, Report, SubScores, Task, WorkflowResult, NO_ANALYSIS_SUMMARY,
    NO_RUBRIC_FAILURE, NO_RUBRIC_HINT, RETRY_HINT, SYNTHESIS_FAILED_SUMMARY,
};
