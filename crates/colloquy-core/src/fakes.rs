//! Deterministic capability fake (testing only)
//!
//! `ScriptedCapability` answers each [`Purpose`] with a canned value, an
//! error, or a value after a delay, and counts the calls it receives.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::capability::{CapabilityError, CapabilityRequest, Purpose, TextCapability};
use crate::domain::Category;

/// A scripted answer.
#[derive(Debug, Clone)]
pub enum Scripted {
    Value(Value),
    Fail(String),
    Delayed(Duration, Value),
}

/// Capability that replays [`Scripted`] answers keyed by purpose.
///
/// Purposes without a script fail with [`CapabilityError::Unavailable`].
#[derive(Debug, Default)]
pub struct ScriptedCapability {
    scripts: HashMap<Purpose, Scripted>,
    calls: Mutex<Vec<Purpose>>,
}

impl ScriptedCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, purpose: Purpose, answer: Scripted) -> Self {
        self.scripts.insert(purpose, answer);
        self
    }

    /// Router answer listing `categories` in order.
    pub fn route_to(self, categories: &[Category]) -> Self {
        let tasks: Vec<Value> = categories
            .iter()
            .map(|c| json!({ "category": c.as_str(), "text_to_analyze": "" }))
            .collect();
        self.on(
            Purpose::Route,
            Scripted::Value(json!({ "subagents_to_call": tasks })),
        )
    }

    pub fn evaluate(self, category: Category, answer: Scripted) -> Self {
        self.on(Purpose::Evaluate(category), answer)
    }

    pub fn summarize(self, summary: &str) -> Self {
        self.on(
            Purpose::Synthesize,
            Scripted::Value(json!({ "summary": summary })),
        )
    }

    /// Number of calls received for `purpose`.
    pub fn calls(&self, purpose: Purpose) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| **p == purpose)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextCapability for ScriptedCapability {
    async fn invoke(&self, request: CapabilityRequest) -> Result<Value, CapabilityError> {
        self.calls.lock().unwrap().push(request.purpose);
        match self.scripts.get(&request.purpose) {
            Some(Scripted::Value(v)) => Ok(v.clone()),
            Some(Scripted::Fail(msg)) => Err(CapabilityError::Transport(msg.clone())),
            Some(Scripted::Delayed(delay, v)) => {
                tokio::time::sleep(*delay).await;
                Ok(v.clone())
            }
            None => Err(CapabilityError::Unavailable(format!(
                "no scripted answer for {}",
                request.purpose
            ))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// An evaluator answer carrying `raw` field values and stock commentary.
pub fn evaluation_answer(raw: &[(&str, f64)]) -> Value {
    let mut answer = json!({
        "what_went_right": "Clear greeting",
        "what_went_wrong": "Frequent filler words",
        "how_to_improve": "Pause silently instead of saying um",
    });
    for (field, value) in raw {
        answer[*field] = json!(value);
    }
    answer
}
