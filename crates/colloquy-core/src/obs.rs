//! Structured lifecycle events for a workflow invocation.
//!
//! Every invocation runs inside a [`WorkflowSpan`] tagged with its id; the
//! `emit_*` functions log one event per lifecycle step.

use std::future::Future;

use tracing::instrument::Instrumented;
use tracing::{info, warn, Instrument};

use crate::domain::Category;

/// Workflow-scoped span.
///
/// Entered guards must not live across `.await`, so the span is attached to
/// the workflow future instead.
pub struct WorkflowSpan {
    span: tracing::Span,
}

impl WorkflowSpan {
    /// Open the `colloquy.workflow` span for one run.
    pub fn new(workflow_id: &str) -> Self {
        Self {
            span: tracing::info_span!("colloquy.workflow", workflow_id = %workflow_id),
        }
    }

    /// Run `fut` inside the workflow span, re-entering it on every poll.
    pub fn wrap<F: Future>(&self, fut: F) -> Instrumented<F> {
        fut.instrument(self.span.clone())
    }
}

/// Workflow accepted input of `input_chars` characters.
pub fn emit_workflow_started(workflow_id: &str, input_chars: usize) {
    info!(event = "workflow.started", workflow_id = %workflow_id, input_chars = input_chars);
}

/// Emit event: router produced `categories`, in order.
pub fn emit_tasks_routed(categories: &[Category]) {
    let list = categories
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(",");
    info!(event = "workflow.routed", task_count = categories.len(), categories = %list);
}

/// Emit event: a task was replaced by a placeholder (warning level).
pub fn emit_task_degraded(category: Category, cause: &dyn std::fmt::Display) {
    warn!(event = "task.degraded", category = %category, cause = %cause);
}

/// Workflow produced its terminal result.
pub fn emit_workflow_finished(
    workflow_id: &str,
    duration_ms: u64,
    report_count: usize,
    total_score: f64,
) {
    info!(
        event = "workflow.finished",
        workflow_id = %workflow_id,
        duration_ms = duration_ms,
        report_count = report_count,
        total_score = total_score,
    );
}
