//! Gemini REST client
//!
//! Implements both [`AnalysisClient`] and [`ContentClient`] against the
//! `models/{model}:generateContent` endpoint with JSON-constrained output.

use crate::client::{AnalysisClient, ContentClient, GeneratedContent};
use crate::config::StudioConfig;
use crate::error::{Result, StudioError, TransportKind};
use crate::model::{AnalysisResult, Audience, MediaKind, SocialContentResult};
use crate::prompts;
use crate::validation::{analysis_schema, decode_response, social_content_schema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("content_studio/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VideoPayload {
    transcript: String,
    description: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ImagePayload {
    description: String,
    #[serde(rename = "textInImage")]
    text_in_image: String,
}

pub struct GeminiClient {
    http_client: reqwest::Client,
    config: StudioConfig,
}

impl GeminiClient {
    pub fn new(config: StudioConfig) -> Result<Self> {
        // No request timeout: a stalled call leaves its item loading until it resolves
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StudioError::transport(TransportKind::Other, e.to_string()))?;

        Ok(Self { http_client, config })
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Send one generateContent request and return the model's JSON text
    async fn generate_json(&self, parts: Vec<Value>, schema: Value) -> Result<String> {
        // Resolved per call; a missing key never reaches the network
        let api_key = self.config.resolve_api_key()?;

        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        });

        let start = Instant::now();
        debug!(model = %self.config.model, "Sending generateContent request");

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let err = classify_http_error(status.as_u16(), &error_text);
            warn!(status = status.as_u16(), "generateContent failed: {}", err);
            return Err(err);
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| StudioError::Schema(format!("Unreadable provider response: {}", e)))?;

        info!(
            model = %self.config.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "generateContent succeeded"
        );
        extract_text(&payload)
    }
}

#[async_trait]
impl AnalysisClient for GeminiClient {
    async fn analyze(&self, kind: MediaKind, encoded: &str, mime_type: &str) -> Result<AnalysisResult> {
        let parts = vec![
            json!({ "text": prompts::analysis_prompt(kind) }),
            json!({ "inline_data": { "mime_type": mime_type, "data": encoded } }),
        ];
        let schema = analysis_schema(kind);
        let text = self.generate_json(parts, schema.clone()).await?;

        match kind {
            MediaKind::Video => {
                let payload: VideoPayload = decode_response(&text, &schema)?;
                Ok(AnalysisResult::Video {
                    transcript: payload.transcript,
                    description: payload.description,
                })
            }
            MediaKind::Image => {
                let payload: ImagePayload = decode_response(&text, &schema)?;
                Ok(AnalysisResult::Image {
                    description: payload.description,
                    text_in_image: payload.text_in_image,
                })
            }
        }
    }
}

#[async_trait]
impl ContentClient for GeminiClient {
    async fn generate_content(
        &self,
        analysis: &AnalysisResult,
        audience: Audience,
        instruction: &str,
    ) -> Result<GeneratedContent> {
        let prompt = prompts::content_prompt(analysis, audience, instruction);
        let schema = social_content_schema();
        let text = self
            .generate_json(vec![json!({ "text": prompt })], schema.clone())
            .await?;
        let result: SocialContentResult = decode_response(&text, &schema)?;

        Ok(GeneratedContent { result, prompt })
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> StudioError {
    let kind = if e.is_timeout() {
        TransportKind::Timeout
    } else {
        TransportKind::Other
    };
    StudioError::transport(kind, e.to_string())
}

/// Map a non-2xx response onto a structured transport error.
///
/// The provider error envelope is `{"error": {"code", "message", "status"}}`.
pub fn classify_http_error(status: u16, body: &str) -> StudioError {
    let envelope: Option<Value> = serde_json::from_str(body).ok();
    let error = envelope.as_ref().and_then(|v| v.get("error"));
    let provider_status = error
        .and_then(|e| e.get("status"))
        .and_then(|s| s.as_str())
        .unwrap_or("");
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            }
        });

    let kind = match (status, provider_status) {
        (408 | 504, _) | (_, "DEADLINE_EXCEEDED") => TransportKind::Timeout,
        (413, _) => TransportKind::PayloadTooLarge,
        _ => TransportKind::Other,
    };

    StudioError::transport(kind, message)
}

/// Concatenate the text parts of the first candidate
pub fn extract_text(payload: &Value) -> Result<String> {
    let parts = payload
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());

    let text: String = parts
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if !text.trim().is_empty() {
        return Ok(text);
    }

    if let Some(reason) = payload
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
    {
        return Err(StudioError::transport(
            TransportKind::Other,
            format!("Request blocked by the provider: {}", reason),
        ));
    }

    Err(StudioError::Schema("Response contained no text".to_string()))
}
