//! The evaluation pipeline.
//!
//! - `router`: picks and orders the categories to evaluate
//! - `evaluator`: the per-category adapter port and its capability-backed adapter
//! - `orchestrator`: concurrent fan-out/fan-in with per-task failure isolation
//! - `synthesizer`: reduces reports into the terminal result

pub mod evaluator;
pub mod orchestrator;
pub mod router;
pub mod synthesizer;

pub use evaluator::{CapabilityEvaluator, EvaluatorPort};
pub use orchestrator::Orchestrator;
pub use router::Router;
pub use synthesizer::{mean_score, Synthesizer};
