//! UMA Organ Interface for content_studio
//!
//! The intent boundary for presentation layers: every user action (upload, analyze,
//! generate, rate, remove, clear) arrives as a [`Stimulus`] and is answered with a
//! [`Response`] whose output is JSON.
//!
//! ## Available Operations
//!
//! 1. `media.submit` - Load and validate files, add them as pending items
//! 2. `media.analyze` - Analyze one item
//! 3. `media.analyze_pending` - Analyze every pending item concurrently
//! 4. `content.generate` - Generate a post for one audience, optional raw instruction
//! 5. `content.regenerate` - Regenerate folding in the saved rating/critique and a new request
//! 6. `content.feedback` - Save a 1-10 rating and critique for the current post
//! 7. `media.remove` / `media.clear` - Drop items and release their previews
//! 8. `media.snapshot` / `studio.report` - Current state, as JSON or developer text
//! 9. `studio.capabilities` / `metrics` - Capability card and request counters
//!
//! ## Example
//!
//! ```rust,no_run
//! use content_studio::organ::{Organ, Stimulus, StudioOrgan};
//! use content_studio::{Studio, StudioConfig};
//! use serde_json::json;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let studio = Arc::new(Studio::with_gemini(StudioConfig::default())?);
//! let organ = StudioOrgan::new(studio);
//!
//! let response = organ.stimulate(Stimulus {
//!     op: "media.submit".to_string(),
//!     input: json!({"paths": ["class.mp4", "poster.png"]}),
//!     context: HashMap::new(),
//! }).await?;
//! println!("{}", response.output);
//! # Ok(())
//! # }
//! ```

use crate::error::StudioError;
use crate::metrics::{Metrics, UNSUPPORTED_OP};
use crate::model::Audience;
use crate::studio::Studio;
use crate::validation::validate_input;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// UMA Stimulus - input to organ operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stimulus {
    pub op: String,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub context: HashMap<String, String>,
}

/// UMA Response - output from organ operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    pub output: Value,
    pub latency_ms: u64,
    pub cost: Option<f64>,
    /// Echo of `context.request_id`, for callers multiplexing concurrent stimuli
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Organ trait - implemented by anything that accepts stimuli
#[async_trait]
pub trait Organ: Send + Sync {
    async fn stimulate(&self, stimulus: Stimulus) -> Result<Response, OrganError>;
    fn describe(&self) -> OrganCard;
}

/// Organ-level errors
#[derive(Debug, Error)]
pub enum OrganError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Studio(#[from] StudioError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl OrganError {
    fn code(&self) -> &'static str {
        match self {
            OrganError::UnsupportedOperation(_) => "UnsupportedOperation",
            OrganError::InvalidInput(_) => "InvalidInput",
            OrganError::Studio(StudioError::Validation(_)) => "ValidationError",
            OrganError::Studio(StudioError::Configuration(_)) => "ConfigurationError",
            OrganError::Studio(StudioError::Transport { .. }) => "TransportError",
            OrganError::Studio(StudioError::Schema(_)) => "SchemaError",
            OrganError::Studio(StudioError::NotFound(_)) => "NotFound",
            OrganError::Studio(StudioError::InvalidState(_)) => "InvalidState",
            OrganError::Studio(_) => "StudioError",
            OrganError::SerializationError(_) => "SerializationError",
        }
    }

    fn message(&self) -> String {
        match self {
            OrganError::Studio(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Organ capability card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganCard {
    pub name: String,
    pub version: String,
    pub description: String,
    pub division: String,
    pub subsystem: String,
    pub tags: Vec<String>,
    pub execution_modes: Vec<String>,
    pub functions: Vec<FunctionCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

/// Function capability card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCard {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub examples: Vec<String>,
    pub idempotent: bool,
    pub side_effects: Vec<String>,
    pub input_schema: Option<Value>,
    pub output_schema: Value,
}

/// Content studio organ
pub struct StudioOrgan {
    studio: Arc<Studio>,
    metrics: Arc<Metrics>,
}

impl StudioOrgan {
    pub fn new(studio: Arc<Studio>) -> Self {
        Self {
            studio,
            metrics: Metrics::new(),
        }
    }

    pub fn with_metrics(studio: Arc<Studio>, metrics: Arc<Metrics>) -> Self {
        Self { studio, metrics }
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    pub fn studio(&self) -> Arc<Studio> {
        Arc::clone(&self.studio)
    }

    /// Handle media.submit operation
    async fn handle_submit(&self, input: Value) -> Result<Value, OrganError> {
        let paths: Vec<PathBuf> = input["paths"]
            .as_array()
            .ok_or_else(|| OrganError::InvalidInput("Missing paths".to_string()))?
            .iter()
            .filter_map(|p| p.as_str().map(PathBuf::from))
            .collect();

        let report = self.studio.submit_paths(&paths).await;
        Ok(serde_json::to_value(&report)?)
    }

    /// Handle media.analyze operation
    async fn handle_analyze(&self, input: Value) -> Result<Value, OrganError> {
        let id = str_field(&input, "id")?;
        let status = self
            .studio
            .analyze(id)
            .await
            .ok_or_else(|| StudioError::NotFound(id.to_string()))?;
        let item = self.studio.item(id).await;

        Ok(json!({
            "id": id,
            "status": status,
            "item": item,
        }))
    }

    /// Handle media.analyze_pending operation
    async fn handle_analyze_pending(&self) -> Result<Value, OrganError> {
        let results = self.studio.analyze_pending().await;
        let items: Vec<Value> = results
            .iter()
            .map(|(id, status)| json!({ "id": id, "status": status }))
            .collect();

        Ok(json!({
            "dispatched": items.len(),
            "items": items,
        }))
    }

    /// Handle content.generate and content.regenerate
    async fn handle_generate(&self, input: Value, compose_feedback: bool) -> Result<Value, OrganError> {
        let id = str_field(&input, "id")?;
        let audience = audience_field(&input)?;

        if self.studio.item(id).await.is_none() {
            return Err(StudioError::NotFound(id.to_string()).into());
        }

        let status = if compose_feedback {
            let request = input["request"].as_str().unwrap_or("");
            self.studio.regenerate(id, audience, request).await
        } else {
            let feedback = input["feedback"].as_str();
            self.studio.generate(id, audience, feedback).await
        };

        let status = status.ok_or_else(|| {
            StudioError::InvalidState(format!("Item {} has not been analyzed successfully", id))
        })?;
        let slot = self.studio.item(id).await.map(|item| match audience {
            Audience::Kids => item.content.kids,
            Audience::Mg => item.content.mg,
        });

        Ok(json!({
            "id": id,
            "audience": audience,
            "status": status,
            "slot": slot,
        }))
    }

    /// Handle content.feedback operation
    async fn handle_feedback(&self, input: Value) -> Result<Value, OrganError> {
        let id = str_field(&input, "id")?;
        let audience = audience_field(&input)?;
        let rating = input["rating"]
            .as_u64()
            .and_then(|r| u8::try_from(r).ok())
            .ok_or_else(|| OrganError::InvalidInput("rating must be an integer from 1 to 10".to_string()))?;
        let feedback_text = input["feedback_text"].as_str().map(str::to_string);

        self.studio
            .save_feedback(id, audience, rating, feedback_text)
            .await?;

        Ok(json!({
            "id": id,
            "audience": audience,
            "rating": rating,
            "saved": true,
        }))
    }

    async fn handle_remove(&self, input: Value) -> Result<Value, OrganError> {
        let id = str_field(&input, "id")?;
        Ok(json!({ "id": id, "removed": self.studio.remove(id).await }))
    }

    async fn handle_snapshot(&self) -> Result<Value, OrganError> {
        let items = self.studio.snapshot().await;
        let pending = self.studio.pending_count().await;
        Ok(json!({ "items": items, "pending": pending }))
    }

    /// Handle studio.capabilities operation
    fn handle_capabilities(&self) -> Result<Value, OrganError> {
        let card = self.describe();
        serde_json::to_value(&card).map_err(OrganError::SerializationError)
    }

    async fn dispatch(&self, op: &str, input: Value) -> Result<Value, OrganError> {
        match op {
            "media.submit" => self.handle_submit(input).await,
            "media.analyze" => self.handle_analyze(input).await,
            "media.analyze_pending" => self.handle_analyze_pending().await,
            "content.generate" => self.handle_generate(input, false).await,
            "content.regenerate" => self.handle_generate(input, true).await,
            "content.feedback" => self.handle_feedback(input).await,
            "media.remove" => self.handle_remove(input).await,
            "media.clear" => Ok(json!({ "removed": self.studio.clear().await })),
            "media.snapshot" => self.handle_snapshot().await,
            "studio.report" => Ok(json!({ "report": self.studio.report().await })),
            "studio.capabilities" => self.handle_capabilities(),
            "metrics" => Ok(json!(self.metrics.snapshot())),
            other => Err(OrganError::UnsupportedOperation(other.to_string())),
        }
    }
}

fn str_field<'a>(input: &'a Value, key: &str) -> Result<&'a str, OrganError> {
    input[key]
        .as_str()
        .ok_or_else(|| OrganError::InvalidInput(format!("Missing {}", key)))
}

fn audience_field(input: &Value) -> Result<Audience, OrganError> {
    Ok(str_field(input, "audience")?.parse()?)
}

#[async_trait]
impl Organ for StudioOrgan {
    async fn stimulate(&self, stimulus: Stimulus) -> Result<Response, OrganError> {
        let start = Instant::now();
        let op = stimulus.op.clone();
        let request_id = stimulus.context.get("request_id").cloned();
        debug!(op = %op, "Stimulus received");

        let card = self.describe();
        let function = card.functions.iter().find(|f| f.name == op);

        let result = match function {
            None => Err(OrganError::UnsupportedOperation(op.clone())),
            Some(function) => {
                let checked = match &function.input_schema {
                    Some(schema) => validate_input(&stimulus.input, schema).map_err(OrganError::from),
                    None => Ok(()),
                };
                match checked {
                    Ok(()) => self.dispatch(&op, stimulus.input).await,
                    Err(e) => Err(e),
                }
            }
        };

        let latency = start.elapsed().as_millis() as u64;
        let metric_key = if function.is_some() { op.as_str() } else { UNSUPPORTED_OP };
        self.metrics.record_request(metric_key, result.is_ok(), latency);

        let (ok, output) = match result {
            Ok(output) => (true, output),
            Err(OrganError::UnsupportedOperation(op)) => (
                false,
                json!({
                    "error": "UnsupportedOperation",
                    "op": op,
                    "available_operations": card.functions.iter().map(|f| f.name.clone()).collect::<Vec<_>>(),
                }),
            ),
            Err(e) => (false, json!({ "error": e.code(), "message": e.message() })),
        };

        Ok(Response {
            ok,
            output,
            latency_ms: latency,
            cost: None,
            request_id,
        })
    }

    fn describe(&self) -> OrganCard {
        let id_input = json!({
            "type": "object",
            "properties": { "id": { "type": "string", "description": "Media item id" } },
            "required": ["id"]
        });
        let slot_output = json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "audience": { "type": "string" },
                "status": { "type": "string" },
                "slot": { "type": "object" }
            }
        });

        OrganCard {
            name: "content_studio".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Media analysis and audience-targeted social post generation with a rating feedback loop".to_string(),
            division: "media".to_string(),
            subsystem: "content-generation".to_string(),
            tags: vec![
                "media".to_string(),
                "video".to_string(),
                "image".to_string(),
                "analysis".to_string(),
                "social".to_string(),
                "generation".to_string(),
                "feedback".to_string(),
            ],
            execution_modes: vec!["embedded".to_string(), "sidecar".to_string()],
            author: None,
            repository: None,
            functions: vec![
                FunctionCard {
                    name: "media.submit".to_string(),
                    description: "Load video/image files, validate size (<= 50MB) and type, and add them as pending items".to_string(),
                    tags: vec!["media".to_string(), "upload".to_string()],
                    examples: vec!["Add a class video and a poster image".to_string()],
                    idempotent: false,
                    side_effects: vec!["reads files".to_string(), "acquires previews".to_string()],
                    input_schema: Some(json!({
                        "type": "object",
                        "properties": {
                            "paths": { "type": "array", "items": { "type": "string" }, "description": "Files to upload" }
                        },
                        "required": ["paths"]
                    })),
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "accepted": { "type": "array", "items": { "type": "string" } },
                            "rejected": { "type": "array", "items": { "type": "object" } }
                        }
                    }),
                },
                FunctionCard {
                    name: "media.analyze".to_string(),
                    description: "Send one item to the model for transcript/description (video) or description/text extraction (image)".to_string(),
                    tags: vec!["media".to_string(), "analysis".to_string()],
                    examples: vec!["Transcribe and summarise an uploaded class video".to_string()],
                    idempotent: false,
                    side_effects: vec!["calls model API".to_string()],
                    input_schema: Some(id_input.clone()),
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "status": { "type": "string" },
                            "item": { "type": "object" }
                        }
                    }),
                },
                FunctionCard {
                    name: "media.analyze_pending".to_string(),
                    description: "Analyze every pending item concurrently".to_string(),
                    tags: vec!["media".to_string(), "analysis".to_string(), "batch".to_string()],
                    examples: vec!["Analyze all newly uploaded files".to_string()],
                    idempotent: false,
                    side_effects: vec!["calls model API".to_string()],
                    input_schema: None,
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "dispatched": { "type": "integer" },
                            "items": { "type": "array", "items": { "type": "object" } }
                        }
                    }),
                },
                FunctionCard {
                    name: "content.generate".to_string(),
                    description: "Draft a social post for one audience (kids | mg) from an analyzed item, with an optional raw instruction".to_string(),
                    tags: vec!["content".to_string(), "generation".to_string()],
                    examples: vec!["Write a Facebook caption for parents from a class video".to_string()],
                    idempotent: false,
                    side_effects: vec!["calls model API".to_string()],
                    input_schema: Some(json!({
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "audience": { "type": "string", "enum": ["kids", "mg"] },
                            "feedback": { "type": "string", "description": "Instruction text passed verbatim" }
                        },
                        "required": ["id", "audience"]
                    })),
                    output_schema: slot_output.clone(),
                },
                FunctionCard {
                    name: "content.regenerate".to_string(),
                    description: "Regenerate a post, composing the saved rating and critique with an optional new request".to_string(),
                    tags: vec!["content".to_string(), "generation".to_string(), "feedback".to_string()],
                    examples: vec!["Make the caption shorter after rating it 3/10".to_string()],
                    idempotent: false,
                    side_effects: vec!["calls model API".to_string()],
                    input_schema: Some(json!({
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "audience": { "type": "string", "enum": ["kids", "mg"] },
                            "request": { "type": "string", "description": "Additional improvement to ask for" }
                        },
                        "required": ["id", "audience"]
                    })),
                    output_schema: slot_output,
                },
                FunctionCard {
                    name: "content.feedback".to_string(),
                    description: "Save a 1-10 rating and optional critique for the current post".to_string(),
                    tags: vec!["content".to_string(), "feedback".to_string()],
                    examples: vec!["Rate the kids caption 7/10: needs a stronger hook".to_string()],
                    idempotent: true,
                    side_effects: vec![],
                    input_schema: Some(json!({
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "audience": { "type": "string", "enum": ["kids", "mg"] },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 10 },
                            "feedback_text": { "type": "string" }
                        },
                        "required": ["id", "audience", "rating"]
                    })),
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "saved": { "type": "boolean" },
                            "rating": { "type": "integer" }
                        }
                    }),
                },
                FunctionCard {
                    name: "media.remove".to_string(),
                    description: "Remove one item and release its preview; in-flight results for it are discarded".to_string(),
                    tags: vec!["media".to_string()],
                    examples: vec!["Remove a blurry photo".to_string()],
                    idempotent: true,
                    side_effects: vec!["releases preview".to_string()],
                    input_schema: Some(id_input),
                    output_schema: json!({
                        "type": "object",
                        "properties": { "removed": { "type": "boolean" } }
                    }),
                },
                FunctionCard {
                    name: "media.clear".to_string(),
                    description: "Remove every item and release all previews".to_string(),
                    tags: vec!["media".to_string()],
                    examples: vec!["Start a fresh session".to_string()],
                    idempotent: true,
                    side_effects: vec!["releases previews".to_string()],
                    input_schema: None,
                    output_schema: json!({
                        "type": "object",
                        "properties": { "removed": { "type": "integer" } }
                    }),
                },
                FunctionCard {
                    name: "media.snapshot".to_string(),
                    description: "Current ordered state of every item and both audience slots".to_string(),
                    tags: vec!["media".to_string(), "state".to_string()],
                    examples: vec!["Re-render the item list".to_string()],
                    idempotent: true,
                    side_effects: vec![],
                    input_schema: None,
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "items": { "type": "array", "items": { "type": "object" } },
                            "pending": { "type": "integer" }
                        }
                    }),
                },
                FunctionCard {
                    name: "studio.report".to_string(),
                    description: "Developer-mode text report with prompts sent, raw results, ratings and errors".to_string(),
                    tags: vec!["diagnostics".to_string()],
                    examples: vec!["Inspect the exact prompt sent for a post".to_string()],
                    idempotent: true,
                    side_effects: vec![],
                    input_schema: None,
                    output_schema: json!({
                        "type": "object",
                        "properties": { "report": { "type": "string" } }
                    }),
                },
                FunctionCard {
                    name: "studio.capabilities".to_string(),
                    description: "Return organ capability card with all available functions and metadata".to_string(),
                    tags: vec!["metadata".to_string(), "discovery".to_string()],
                    examples: vec!["Discover available studio operations".to_string()],
                    idempotent: true,
                    side_effects: vec![],
                    input_schema: None,
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "version": { "type": "string" },
                            "functions": { "type": "array" }
                        }
                    }),
                },
                FunctionCard {
                    name: "metrics".to_string(),
                    description: "Request counters and latency averages".to_string(),
                    tags: vec!["metrics".to_string()],
                    examples: vec!["Check the failure rate".to_string()],
                    idempotent: true,
                    side_effects: vec![],
                    input_schema: None,
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "total_requests": { "type": "integer" },
                            "operations": { "type": "object" }
                        }
                    }),
                },
            ],
        }
    }
}
