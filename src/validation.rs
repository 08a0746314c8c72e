//! Validation against JSON schemas
//!
//! Used in two directions: organ inputs are checked leniently (required fields and types),
//! model responses strictly (additionally no fields outside `properties`). The response
//! schemas are the same documents sent to the provider as `responseSchema`, so type names
//! follow the provider's upper-case convention and are compared case-insensitively.

use crate::error::{Result, StudioError};
use crate::model::MediaKind;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub fn video_analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "transcript": {
                "type": "STRING",
                "description": "Full transcript of all speech in the video."
            },
            "description": {
                "type": "STRING",
                "description": "A 3-5 sentence summary of the video's content, topic and tone."
            }
        },
        "required": ["transcript", "description"]
    })
}

pub fn image_analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "description": {
                "type": "STRING",
                "description": "A detailed 3-5 sentence description of the image's content, setting and mood."
            },
            "textInImage": {
                "type": "STRING",
                "description": "All text extracted from the image."
            }
        },
        "required": ["description", "textInImage"]
    })
}

pub fn analysis_schema(kind: MediaKind) -> Value {
    match kind {
        MediaKind::Video => video_analysis_schema(),
        MediaKind::Image => image_analysis_schema(),
    }
}

pub fn social_content_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "goal_summary": { "type": "STRING", "description": "One sentence summarising the goal of the content." },
            "title": { "type": "STRING", "description": "Title / hook of the post." },
            "caption": { "type": "STRING", "description": "Main body of the post, at most 150 words." },
            "hashtags": { "type": "ARRAY", "items": { "type": "STRING" }, "description": "Relevant hashtags." },
            "suggested_image_ideas": { "type": "STRING", "description": "Ideas for accompanying images or video." },
            "optimal_post_time": { "type": "STRING", "description": "Suggested optimal posting time." },
            "optimization_tips": { "type": "ARRAY", "items": { "type": "STRING" }, "description": "3 optimisation tips (timing, assets, micro-targeting)." },
            "implementation_notes": { "type": "ARRAY", "items": { "type": "STRING" }, "description": "2-4 notes to keep in mind when publishing." }
        },
        "required": [
            "goal_summary",
            "title",
            "caption",
            "hashtags",
            "suggested_image_ideas",
            "optimal_post_time",
            "optimization_tips",
            "implementation_notes"
        ]
    })
}

/// Validate input against a JSON schema: required fields present, declared types match
pub fn validate_input(input: &Value, schema: &Value) -> Result<()> {
    check(input, schema, false).map_err(StudioError::Validation)
}

/// Validate a model response: like [`validate_input`] but unknown fields are rejected
pub fn validate_response(output: &Value, schema: &Value) -> Result<()> {
    check(output, schema, true).map_err(StudioError::Schema)
}

/// Parse model text as JSON, validate it strictly and deserialize
pub fn decode_response<T: DeserializeOwned>(text: &str, schema: &Value) -> Result<T> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| StudioError::Schema(format!("Response is not valid JSON: {}", e)))?;
    validate_response(&value, schema)?;
    serde_json::from_value(value).map_err(|e| StudioError::Schema(e.to_string()))
}

fn check(value: &Value, schema: &Value, strict: bool) -> std::result::Result<(), String> {
    validate_type(value, schema)?;

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field_name in required {
            let field_str = field_name
                .as_str()
                .ok_or_else(|| "Invalid schema: required field not a string".to_string())?;

            if value.get(field_str).is_none() {
                return Err(format!("Missing required field: {}", field_str));
            }
        }
    }

    let properties = schema.get("properties").and_then(|p| p.as_object());
    if let (Some(properties), Some(object)) = (properties, value.as_object()) {
        for (key, field) in object {
            match properties.get(key) {
                Some(prop_schema) => check(field, prop_schema, strict)
                    .map_err(|e| format!("{}: {}", key, e))?,
                None if strict => return Err(format!("Unexpected field: {}", key)),
                None => {}
            }
        }
    }

    if let (Some(items), Some(array)) = (schema.get("items"), value.as_array()) {
        for (idx, element) in array.iter().enumerate() {
            check(element, items, strict).map_err(|e| format!("[{}]: {}", idx, e))?;
        }
    }

    Ok(())
}

/// Validate that a value matches the expected type
fn validate_type(value: &Value, schema: &Value) -> std::result::Result<(), String> {
    if let Some(expected_type) = schema.get("type").and_then(|t| t.as_str()) {
        let expected = expected_type.to_ascii_lowercase();
        let valid = match expected.as_str() {
            "string" => value.is_string(),
            "integer" => value.is_i64() || value.is_u64(),
            "number" => value.is_number(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            "null" => value.is_null(),
            _ => true, // Unknown types pass validation
        };

        if !valid {
            return Err(format!("Type mismatch: expected {}, got {}", expected, value));
        }
    }

    Ok(())
}
