//! Per-category evaluator port.
//!
//! [`EvaluatorPort`] is the seam between the orchestrator and whatever
//! produces raw judgments. [`CapabilityEvaluator`] implements it on top of a
//! [`TextCapability`], one profile per category.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::capability::{CapabilityRequest, FieldKind, Purpose, ResponseSchema, TextCapability};
use crate::domain::{Category, Commentary, EvaluationError, RawEvaluation, Task};
use crate::prompts;
use crate::rubric::{CategoryRubric, RubricTable};

/// Produces a [`RawEvaluation`] for one task.
#[async_trait]
pub trait EvaluatorPort: Send + Sync {
    async fn evaluate(&self, task: &Task) -> Result<RawEvaluation, EvaluationError>;

    /// Whether an adapter is registered for `category`.
    fn supports(&self, _category: Category) -> bool {
        true
    }
}

/// Evaluator that asks the text-understanding capability for the raw fields
/// of the category's rubric.
pub struct CapabilityEvaluator {
    capability: Arc<dyn TextCapability>,
    rubric: Arc<RubricTable>,
    enabled: HashSet<Category>,
}

impl CapabilityEvaluator {
    /// Evaluators for `enabled` categories, all sharing `capability`.
    pub fn new(
        capability: Arc<dyn TextCapability>,
        rubric: Arc<RubricTable>,
        enabled: impl IntoIterator<Item = Category>,
    ) -> Self {
        Self {
            capability,
            rubric,
            enabled: enabled.into_iter().collect(),
        }
    }

    fn schema(rubric: &CategoryRubric) -> ResponseSchema {
        let mut schema = ResponseSchema::new(format!("{}Evaluation", rubric.category));
        for field in rubric.raw_fields() {
            schema = schema.field(field, FieldKind::Number, prompts::raw_field_description(field));
        }
        schema
            .field("what_went_right", FieldKind::String, "what the speaker did well")
            .field("what_went_wrong", FieldKind::String, "what hurt the score")
            .field("how_to_improve", FieldKind::String, "one concrete suggestion")
    }

    fn parse(
        rubric: &CategoryRubric,
        value: Value,
    ) -> Result<RawEvaluation, EvaluationError> {
        let category = rubric.category;
        let mut raw = HashMap::new();
        for field in rubric.raw_fields() {
            let v = value
                .get(field)
                .and_then(Value::as_f64)
                .ok_or_else(|| EvaluationError::new(category, format!("missing number '{field}'")))?;
            if !(0.0..=1.0).contains(&v) {
                return Err(EvaluationError::new(
                    category,
                    format!("'{field}' = {v} is outside [0, 1]"),
                ));
            }
            raw.insert(field.to_string(), v);
        }

        let commentary: Commentary = serde_json::from_value(value)
            .map_err(|e| EvaluationError::new(category, format!("bad commentary: {e}")))?;

        Ok(RawEvaluation {
            category,
            sub_scores: rubric.derive_sub_scores(&raw),
            commentary,
        })
    }
}

#[async_trait]
impl EvaluatorPort for CapabilityEvaluator {
    async fn evaluate(&self, task: &Task) -> Result<RawEvaluation, EvaluationError> {
        let category = task.category;
        if !self.supports(category) {
            return Err(EvaluationError::new(
                category,
                format!("no evaluator registered for {category}"),
            ));
        }
        let rubric = self
            .rubric
            .rubric(category)
            .map_err(|e| EvaluationError::new(category, e.to_string()))?;

        let request = CapabilityRequest {
            purpose: Purpose::Evaluate(category),
            system_instruction: prompts::evaluator_instruction(category),
            user_content: json!({ "transcript": task.text }).to_string(),
            schema: Self::schema(rubric),
        };
        let value = self
            .capability
            .invoke(request)
            .await
            .map_err(|e| EvaluationError::new(category, e.to_string()))?;

        let evaluation = Self::parse(rubric, value)?;
        debug!(category = %category, sub_scores = evaluation.sub_scores.len(), "evaluation parsed");
        Ok(evaluation)
    }

    fn supports(&self, category: Category) -> bool {
        self.enabled.contains(&category)
    }
}
