//! End-to-end workflow: route, evaluate concurrently, synthesize.

use std::sync::Arc;
use std::time::Instant;

use colloquy_store::FeedbackRecord;
use tracing::debug;
use uuid::Uuid;

use crate::capability::TextCapability;
use crate::config::WorkflowConfig;
use crate::domain::{Result, WorkflowResult};
use crate::evaluation::{CapabilityEvaluator, EvaluatorPort, Orchestrator, Router, Synthesizer};
use crate::metrics::METRICS;
use crate::obs::{self, WorkflowSpan};
use crate::rubric::RubricTable;

/// A workflow result with its wall-clock processing time.
#[derive(Debug, Clone)]
pub struct TimedResult {
    pub result: WorkflowResult,
    pub elapsed_ms: u64,
}

impl TimedResult {
    /// The storable form of this result for `input_text`.
    pub fn to_record(&self, input_text: &str) -> Result<FeedbackRecord> {
        Ok(FeedbackRecord::new(
            input_text,
            self.result.summary.clone(),
            self.result.total_score,
            serde_json::to_value(&self.result.reports)?,
            self.elapsed_ms,
        ))
    }
}

/// Router, orchestrator and synthesizer wired for one configuration.
///
/// Reusable across invocations; each `run` is independent.
pub struct Workflow {
    router: Router,
    orchestrator: Orchestrator,
    synthesizer: Synthesizer,
}

impl Workflow {
    /// Wire a workflow whose evaluators all go through `capability`.
    pub fn new(
        capability: Arc<dyn TextCapability>,
        rubric: RubricTable,
        config: WorkflowConfig,
    ) -> Result<Self> {
        let rubric = Arc::new(rubric);
        let evaluator = CapabilityEvaluator::new(
            Arc::clone(&capability),
            Arc::clone(&rubric),
            config.enabled_categories.iter().copied(),
        );
        Self::with_evaluator(capability, Arc::new(evaluator), rubric, config)
    }

    /// Wire a workflow with a custom evaluator port.
    pub fn with_evaluator(
        capability: Arc<dyn TextCapability>,
        evaluator: Arc<dyn EvaluatorPort>,
        rubric: Arc<RubricTable>,
        config: WorkflowConfig,
    ) -> Result<Self> {
        config.validate()?;
        debug!(
            capability = capability.name(),
            timeout_ms = config.evaluator_timeout_ms,
            "workflow configured"
        );
        Ok(Self {
            router: Router::new(Arc::clone(&capability)),
            orchestrator: Orchestrator::new(evaluator, rubric, config.evaluator_timeout()),
            synthesizer: Synthesizer::new(capability),
        })
    }

    /// Run the whole workflow on `text`. Never fails.
    pub async fn run(&self, text: &str) -> WorkflowResult {
        self.run_timed(text).await.result
    }

    /// Like [`Workflow::run`], also reporting wall-clock time.
    pub async fn run_timed(&self, text: &str) -> TimedResult {
        let workflow_id = Uuid::new_v4().to_string();
        let span = WorkflowSpan::new(&workflow_id);
        span.wrap(self.execute(&workflow_id, text)).await
    }

    async fn execute(&self, workflow_id: &str, text: &str) -> TimedResult {
        let started = Instant::now();
        METRICS.inc_workflows();
        obs::emit_workflow_started(workflow_id, text.chars().count());

        let tasks = self.router.route(text).await;
        let routed: Vec<_> = tasks.iter().map(|t| t.category).collect();
        obs::emit_tasks_routed(&routed);

        let reports = self.orchestrator.run(tasks).await;
        let result = self.synthesizer.synthesize(text, reports).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        obs::emit_workflow_finished(
            workflow_id,
            elapsed_ms,
            result.reports.len(),
            result.total_score,
        );
        TimedResult { result, elapsed_ms }
    }
}
