//! Tasks, evaluations, reports and the terminal workflow result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::category::Category;

/// Summary returned when there is nothing to analyze.
pub const NO_ANALYSIS_SUMMARY: &str = "No analysis";

/// Summary returned when the final narrative could not be produced.
pub const SYNTHESIS_FAILED_SUMMARY: &str = "Failed to synthesize final answer.";

/// `what_went_wrong` of a placeholder for a category without a rubric.
pub const NO_RUBRIC_FAILURE: &str = "No prompt/model defined for this category";

/// `how_to_improve` of a placeholder for a category without a rubric.
pub const NO_RUBRIC_HINT: &str = "Add a rubric and evaluator for this category";

/// `how_to_improve` of a placeholder for a failed evaluation.
pub const RETRY_HINT: &str = "retry or adjust input";

/// Characteristic name to score in [0, 1].
pub type SubScores = BTreeMap<String, f64>;

/// One unit of work: evaluate `text` along `category`.
///
/// `text` is always the full original input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub category: Category,
    pub text: String,
}

impl Task {
    /// Task for `category` over the full input `text`.
    pub fn new(category: Category, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
        }
    }
}

/// Qualitative feedback attached to an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commentary {
    pub what_went_right: String,
    pub what_went_wrong: String,
    pub how_to_improve: String,
}

/// An evaluator's output before scoring.
///
/// `sub_scores` are already oriented so that 1.0 is ideal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvaluation {
    pub category: Category,
    pub sub_scores: SubScores,
    pub commentary: Commentary,
}

/// The scored outcome of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub category: Category,
    pub score: f64,
    pub sub_scores: SubScores,
    #[serde(flatten)]
    pub commentary: Commentary,
}

impl Report {
    /// Fold a successful evaluation and its rubric score into a report.
    pub fn scored(raw: RawEvaluation, score: f64) -> Self {
        Self {
            category: raw.category,
            score,
            sub_scores: raw.sub_scores,
            commentary: raw.commentary,
        }
    }

    /// A locally synthesized stand-in for a task that could not complete.
    pub fn placeholder(
        category: Category,
        what_went_wrong: impl Into<String>,
        how_to_improve: impl Into<String>,
    ) -> Self {
        Self {
            category,
            score: 0.0,
            sub_scores: SubScores::new(),
            commentary: Commentary {
                what_went_right: String::new(),
                what_went_wrong: what_went_wrong.into(),
                how_to_improve: how_to_improve.into(),
            },
        }
    }

    /// Whether this report stands in for a failed task.
    pub fn is_placeholder(&self) -> bool {
        self.score == 0.0 && self.sub_scores.is_empty()
    }
}

/// The terminal artifact of one workflow invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub reports: Vec<Report>,
    pub summary: String,
    pub total_score: f64,
}

impl WorkflowResult {
    /// Fixed result for empty or degenerate input.
    pub fn no_analysis(reports: Vec<Report>) -> Self {
        Self {
            reports,
            summary: NO_ANALYSIS_SUMMARY.to_string(),
            total_score: 0.0,
        }
    }

    /// Fixed result when the narrative summary could not be produced.
    pub fn synthesis_failed(reports: Vec<Report>) -> Self {
        Self {
            reports,
            summary: SYNTHESIS_FAILED_SUMMARY.to_string(),
            total_score: 0.0,
        }
    }
}
