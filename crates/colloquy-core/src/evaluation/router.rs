//! Task decomposition.
//!
//! One capability call picks the relevant categories and orders them by
//! prevalence. The router never fails: a capability error or an answer that
//! does not parse yields an empty task list.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::capability::{CapabilityRequest, FieldKind, Purpose, ResponseSchema, TextCapability};
use crate::domain::{Category, Task};
use crate::prompts;

#[derive(Debug, Deserialize)]
struct RoutingPlan {
    subagents_to_call: Vec<RoutedTask>,
}

/// The model may also suggest a `text_to_analyze` span; it is ignored and
/// every task carries the full input.
#[derive(Debug, Deserialize)]
struct RoutedTask {
    category: Category,
}

/// Splits the input into one task per category worth evaluating.
pub struct Router {
    capability: Arc<dyn TextCapability>,
}

impl Router {
    /// Route through `capability`.
    pub fn new(capability: Arc<dyn TextCapability>) -> Self {
        Self { capability }
    }

    fn schema() -> ResponseSchema {
        ResponseSchema::new("RoutingPlan").field(
            "subagents_to_call",
            FieldKind::Array,
            "ordered list of {\"category\": one of FLUENCY, PROSODY, PRAGMATICS, \
             CONSIDERATION, TIME_BALANCE, \"text_to_analyze\": string}",
        )
    }

    /// Ordered tasks for `text`, most prevalent category first.
    #[instrument(skip_all, fields(input_chars = text.len()))]
    pub async fn route(&self, text: &str) -> Vec<Task> {
        if text.trim().is_empty() {
            debug!("blank input, nothing to route");
            return Vec::new();
        }

        let request = CapabilityRequest {
            purpose: Purpose::Route,
            system_instruction: prompts::router_instruction(),
            user_content: text.to_string(),
            schema: Self::schema(),
        };

        let value = match self.capability.invoke(request).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "router call failed, routing to no tasks");
                return Vec::new();
            }
        };

        let plan: RoutingPlan = match serde_json::from_value(value) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, "router answer did not parse, routing to no tasks");
                return Vec::new();
            }
        };

        plan_to_tasks(plan, text)
    }
}

/// First occurrence of each category wins; every task gets the full input.
fn plan_to_tasks(plan: RoutingPlan, text: &str) -> Vec<Task> {
    let mut seen = HashSet::new();
    plan.subagents_to_call
        .into_iter()
        .filter(|routed| seen.insert(routed.category))
        .map(|routed| Task::new(routed.category, text))
        .collect()
}
