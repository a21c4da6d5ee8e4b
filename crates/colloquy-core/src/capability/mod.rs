//! The text-understanding capability consumed by the router, the evaluators
//! and the synthesizer.
//!
//! A capability receives an instruction, the user content and a
//! [`ResponseSchema`], and must either return a JSON object conforming to the
//! schema or fail. Nothing else about the provider is assumed.

pub mod http;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::Category;

pub use http::HttpCapability;

/// What an invocation is for. Providers may pick a model per purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    Route,
    Evaluate(Category),
    Synthesize,
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Purpose::Route => f.write_str("route"),
            Purpose::Evaluate(category) => write!(f, "evaluate:{category}"),
            Purpose::Synthesize => f.write_str("synthesize"),
        }
    }
}

/// JSON type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    String,
    Boolean,
    Array,
}

impl FieldKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::Number => value.is_number(),
            FieldKind::String => value.is_string(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Array => value.is_array(),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
            FieldKind::Array => "array",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub description: String,
}

/// Shape constraint on a capability response: a flat JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSchema {
    pub name: String,
    pub fields: Vec<SchemaField>,
}

impl ResponseSchema {
    /// Empty schema for an object called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a required field.
    pub fn field(mut self, name: &str, kind: FieldKind, description: &str) -> Self {
        self.fields.push(SchemaField {
            name: name.to_string(),
            kind,
            required: true,
            description: description.to_string(),
        });
        self
    }

    /// Add an optional field.
    pub fn optional(mut self, name: &str, kind: FieldKind, description: &str) -> Self {
        self.fields.push(SchemaField {
            name: name.to_string(),
            kind,
            required: false,
            description: description.to_string(),
        });
        self
    }

    /// Check that `value` is an object carrying every required field with
    /// the declared JSON type. Optional fields are type-checked when present.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        let object = value
            .as_object()
            .ok_or_else(|| format!("{} response is not a JSON object", self.name))?;
        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(format!("{} response missing field '{}'", self.name, field.name));
                }
                None | Some(Value::Null) => {}
                Some(v) if !field.kind.matches(v) => {
                    return Err(format!(
                        "{} response field '{}' is not a {}",
                        self.name,
                        field.name,
                        field.kind.as_str()
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Plain-text description of the expected object, appended to the
    /// instruction sent to the provider.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Respond with a single JSON object ({}) and nothing else. Fields:\n",
            self.name
        );
        for field in &self.fields {
            out.push_str(&format!(
                "- \"{}\" ({}{}): {}\n",
                field.name,
                field.kind.as_str(),
                if field.required { "" } else { ", optional" },
                field.description
            ));
        }
        out
    }
}

/// One request to the capability.
#[derive(Debug, Clone)]
pub struct CapabilityRequest {
    pub purpose: Purpose,
    pub system_instruction: String,
    pub user_content: String,
    pub schema: ResponseSchema,
}

/// Failures of the text-understanding capability.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CapabilityError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("capability unavailable: {0}")]
    Unavailable(String),
}

impl CapabilityError {
    /// Whether the transport layer may retry after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            CapabilityError::Transport(_) | CapabilityError::Timeout { .. } => true,
            CapabilityError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// The external text-understanding capability.
#[async_trait]
pub trait TextCapability: Send + Sync {
    async fn invoke(&self, request: CapabilityRequest) -> Result<Value, CapabilityError>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}
