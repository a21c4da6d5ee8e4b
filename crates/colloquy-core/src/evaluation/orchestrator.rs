//! Concurrent fan-out/fan-in over routed tasks.
//!
//! Every task runs in its own tokio task inside a [`JoinSet`], bounded by
//! the evaluator timeout.
//! The join collects results in task order, not completion order, and every
//! failure mode (missing rubric, unsupported category, evaluator error,
//! timeout, aborted unit) becomes a placeholder [`Report`] for that task only.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, info_span, warn, Instrument};

use crate::domain::{
    Category, ColloquyError, RawEvaluation, Report, Result, Task, NO_RUBRIC_FAILURE,
    NO_RUBRIC_HINT, RETRY_HINT,
};
use crate::evaluation::evaluator::EvaluatorPort;
use crate::metrics::METRICS;
use crate::obs;
use crate::rubric::RubricTable;
use crate::scorer;

const ABORTED: &str = "evaluator unit aborted";

/// Runs routed tasks concurrently and scores each against its rubric.
///
/// Units are owned by the `run` future: dropping it aborts whatever is
/// still in flight.
pub struct Orchestrator {
    evaluator: Arc<dyn EvaluatorPort>,
    rubric: Arc<RubricTable>,
    timeout: Duration,
}

impl Orchestrator {
    /// `timeout` bounds each evaluator call individually.
    pub fn new(
        evaluator: Arc<dyn EvaluatorPort>,
        rubric: Arc<RubricTable>,
        timeout: Duration,
    ) -> Self {
        Self {
            evaluator,
            rubric,
            timeout,
        }
    }

    /// One report per task, in task order. Never fails.
    pub async fn run(&self, tasks: Vec<Task>) -> Vec<Report> {
        if tasks.is_empty() {
            return Vec::new();
        }

        let categories: Vec<Category> = tasks.iter().map(|t| t.category).collect();
        let mut units = JoinSet::new();
        for (index, task) in tasks.into_iter().enumerate() {
            let category = task.category;
            let unit = run_unit(
                Arc::clone(&self.evaluator),
                Arc::clone(&self.rubric),
                self.timeout,
                task,
            )
            .instrument(info_span!("colloquy.task", category = %category));
            units.spawn(async move {
                let outcome = AssertUnwindSafe(unit).catch_unwind().await;
                (index, outcome.map_err(|payload| panic_message(&*payload)))
            });
        }

        let mut slots: Vec<Option<Report>> = vec![None; categories.len()];
        while let Some(joined) = units.join_next().await {
            match joined {
                Ok((index, Ok(report))) => slots[index] = Some(report),
                Ok((index, Err(message))) => {
                    slots[index] = Some(degrade(
                        categories[index],
                        format!("{ABORTED}: {message}"),
                        RETRY_HINT,
                    ));
                }
                Err(e) => warn!(error = %e, "evaluator unit lost"),
            }
        }

        slots
            .into_iter()
            .zip(categories)
            .map(|(slot, category)| slot.unwrap_or_else(|| degrade(category, ABORTED, RETRY_HINT)))
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}

async fn run_unit(
    evaluator: Arc<dyn EvaluatorPort>,
    rubric: Arc<RubricTable>,
    timeout: Duration,
    task: Task,
) -> Report {
    let category = task.category;

    let weights = match rubric.weights(category) {
        Ok(weights) => weights,
        Err(_) => return degrade(category, NO_RUBRIC_FAILURE, NO_RUBRIC_HINT),
    };
    if !evaluator.supports(category) {
        return degrade(
            category,
            format!("no evaluator registered for {category}"),
            RETRY_HINT,
        );
    }

    match evaluate_within(evaluator.as_ref(), &task, timeout).await {
        Ok(raw) => {
            let score = scorer::score(&raw.sub_scores, &weights);
            debug!(score, "evaluation scored");
            METRICS.inc_evaluations_succeeded();
            Report::scored(raw, score)
        }
        Err(ColloquyError::Evaluation { cause, .. }) => degrade(category, cause, RETRY_HINT),
        Err(other) => degrade(category, other.to_string(), RETRY_HINT),
    }
}

/// Evaluate `task`, turning an elapsed `timeout` into an evaluation error.
async fn evaluate_within(
    evaluator: &dyn EvaluatorPort,
    task: &Task,
    timeout: Duration,
) -> Result<RawEvaluation> {
    match tokio::time::timeout(timeout, evaluator.evaluate(task)).await {
        Ok(outcome) => Ok(outcome?),
        Err(_) => Err(ColloquyError::Evaluation {
            category: task.category,
            cause: format!("timed out after {} ms", timeout.as_millis()),
        }),
    }
}

fn degrade(category: Category, cause: impl Into<String>, hint: &str) -> Report {
    let cause = cause.into();
    obs::emit_task_degraded(category, &cause);
    METRICS.inc_evaluations_degraded();
    Report::placeholder(category, cause, hint)
}
