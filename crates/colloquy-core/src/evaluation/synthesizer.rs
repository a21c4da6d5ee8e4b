//! Reduction of per-category reports into the terminal result.
//!
//! The total score is always the local mean of the report scores. The
//! capability only writes the narrative and judges whether the input was
//! degenerate; any total it reports is discarded.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{instrument, warn};

use crate::capability::{CapabilityRequest, FieldKind, Purpose, ResponseSchema, TextCapability};
use crate::domain::{ColloquyError, Report, Result, WorkflowResult, NO_ANALYSIS_SUMMARY};
use crate::metrics::METRICS;
use crate::prompts;

#[derive(Debug, Deserialize)]
struct SynthesisAnswer {
    summary: String,
    #[serde(default)]
    degenerate: bool,
}

impl SynthesisAnswer {
    fn is_degenerate(&self) -> bool {
        self.degenerate || self.summary.trim().eq_ignore_ascii_case(NO_ANALYSIS_SUMMARY)
    }
}

/// Arithmetic mean of the report scores, rounded to 2 decimal places.
pub fn mean_score(reports: &[Report]) -> f64 {
    if reports.is_empty() {
        return 0.0;
    }
    let mean = reports.iter().map(|r| r.score).sum::<f64>() / reports.len() as f64;
    (mean * 100.0).round() / 100.0
}

/// Produces the narrative summary and the final [`WorkflowResult`].
pub struct Synthesizer {
    capability: Arc<dyn TextCapability>,
}

impl Synthesizer {
    /// Synthesize through `capability`.
    pub fn new(capability: Arc<dyn TextCapability>) -> Self {
        Self { capability }
    }

    fn schema() -> ResponseSchema {
        ResponseSchema::new("Synthesis")
            .field("summary", FieldKind::String, "combined narrative feedback")
            .optional(
                "degenerate",
                FieldKind::Boolean,
                "true when the transcript has no evaluable content",
            )
            .optional("total_score", FieldKind::Number, "your estimate of the overall score")
    }

    /// Never fails; see [`WorkflowResult::no_analysis`] and
    /// [`WorkflowResult::synthesis_failed`] for the fixed outcomes.
    #[instrument(skip_all, fields(reports = reports.len()))]
    pub async fn synthesize(&self, input_text: &str, reports: Vec<Report>) -> WorkflowResult {
        if reports.is_empty() {
            return WorkflowResult::no_analysis(reports);
        }

        match self.request_answer(input_text, &reports).await {
            Ok(answer) if answer.is_degenerate() => WorkflowResult::no_analysis(reports),
            Ok(answer) => WorkflowResult {
                total_score: mean_score(&reports),
                summary: answer.summary,
                reports,
            },
            Err(e) => {
                warn!(error = %e, "synthesis failed");
                METRICS.inc_synthesis_failures();
                WorkflowResult::synthesis_failed(reports)
            }
        }
    }

    async fn request_answer(&self, input_text: &str, reports: &[Report]) -> Result<SynthesisAnswer> {
        let request = CapabilityRequest {
            purpose: Purpose::Synthesize,
            system_instruction: prompts::synthesizer_instruction(),
            user_content: json!({ "transcript": input_text, "reports": reports }).to_string(),
            schema: Self::schema(),
        };
        let value = self
            .capability
            .invoke(request)
            .await
            .map_err(|e| ColloquyError::Synthesis(e.to_string()))?;
        serde_json::from_value(value)
            .map_err(|e| ColloquyError::Synthesis(format!("synthesis answer did not parse: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, RawEvaluation, SubScores, SYNTHESIS_FAILED_SUMMARY};
    use crate::fakes::{Scripted, ScriptedCapability};

    fn report(category: Category, score: f64) -> Report {
        Report::scored(
            RawEvaluation {
                category,
                sub_scores: SubScores::from([("x".to_string(), score)]),
                commentary: Default::default(),
            },
            score,
        )
    }

    fn reports() -> Vec<Report> {
        vec![
            report(Category::Fluency, 0.8),
            report(Category::Prosody, 0.6),
            report(Category::Pragmatics, 1.0),
        ]
    }

    #[test]
    fn test_mean_score_rounds_to_two_places() {
        assert_eq!(mean_score(&reports()), 0.8);
        assert_eq!(
            mean_score(&[
                report(Category::Fluency, 0.7),
                report(Category::Prosody, 0.0),
                report(Category::Pragmatics, 0.0),
            ]),
            0.23
        );
        assert_eq!(mean_score(&[]), 0.0);
    }

    #[tokio::test]
    async fn test_empty_reports_skip_capability() {
        let cap = Arc::new(ScriptedCapability::new().summarize("great"));
        let result = Synthesizer::new(cap.clone()).synthesize("", vec![]).await;
        assert_eq!(result.summary, NO_ANALYSIS_SUMMARY);
        assert_eq!(result.total_score, 0.0);
        assert_eq!(cap.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_model_total_is_discarded() {
        let cap = Arc::new(ScriptedCapability::new().on(
            Purpose::Synthesize,
            Scripted::Value(json!({ "summary": "Solid answer.", "total_score": 0.1 })),
        ));
        let result = Synthesizer::new(cap).synthesize("hi", reports()).await;
        assert_eq!(result.summary, "Solid answer.");
        assert_eq!(result.total_score, 0.8);
        assert_eq!(result.reports.len(), 3);
    }

    #[tokio::test]
    async fn test_degenerate_judgement_yields_no_analysis() {
        for answer in [
            json!({ "summary": "whatever", "degenerate": true }),
            json!({ "summary": " no analysis " }),
        ] {
            let cap = Arc::new(
                ScriptedCapability::new().on(Purpose::Synthesize, Scripted::Value(answer)),
            );
            let result = Synthesizer::new(cap)
                .synthesize("transcribing...", reports())
                .await;
            assert_eq!(result.summary, NO_ANALYSIS_SUMMARY);
            assert_eq!(result.total_score, 0.0);
        }
    }

    #[tokio::test]
    async fn test_failure_overrides_valid_average() {
        let cap = Arc::new(
            ScriptedCapability::new().on(Purpose::Synthesize, Scripted::Fail("timeout".into())),
        );
        let result = Synthesizer::new(cap).synthesize("hi", reports()).await;
        assert_eq!(result.summary, SYNTHESIS_FAILED_SUMMARY);
        assert_eq!(result.total_score, 0.0);
        assert_eq!(result.reports.len(), 3);
    }

    #[tokio::test]
    async fn test_capability_failure_surfaces_as_synthesis_error() {
        let cap = Arc::new(
            ScriptedCapability::new().on(Purpose::Synthesize, Scripted::Fail("timeout".into())),
        );
        let err = Synthesizer::new(cap)
            .request_answer("hi", &reports())
            .await
            .unwrap_err();
        match err {
            ColloquyError::Synthesis(cause) => assert!(cause.contains("timeout")),
            other => panic!("Expected Synthesis, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_answer_surfaces_as_synthesis_error() {
        let cap = Arc::new(ScriptedCapability::new().on(
            Purpose::Synthesize,
            Scripted::Value(json!({ "degenerate": false })),
        ));
        let synthesizer = Synthesizer::new(cap);
        let err = synthesizer.request_answer("hi", &reports()).await.unwrap_err();
        assert!(matches!(err, ColloquyError::Synthesis(ref cause) if cause.contains("did not parse")));

        let result = synthesizer.synthesize("hi", reports()).await;
        assert_eq!(result.summary, SYNTHESIS_FAILED_SUMMARY);
    }
}
