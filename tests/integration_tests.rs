//! Integration tests for content_studio organ operations

use async_trait::async_trait;
use content_studio::organ::{Organ, Response, Stimulus, StudioOrgan};
use content_studio::{
    prompts, AnalysisClient, AnalysisResult, Audience, ContentClient, GeneratedContent, MediaKind,
    ObjectUrlRegistry, SocialContentResult, Studio, StudioConfig, StudioError, TransportKind,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Analyzer returning fixed results; small payloads answer last
struct StubAnalyzer;

#[async_trait]
impl AnalysisClient for StubAnalyzer {
    async fn analyze(&self, kind: MediaKind, encoded: &str, _mime: &str) -> content_studio::Result<AnalysisResult> {
        if encoded.len() < 1024 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok(match kind {
            MediaKind::Image => AnalysisResult::Image {
                description: "A".to_string(),
                text_in_image: "B".to_string(),
            },
            MediaKind::Video => AnalysisResult::Video {
                transcript: "T".to_string(),
                description: "V".to_string(),
            },
        })
    }
}

struct TimeoutAnalyzer;

#[async_trait]
impl AnalysisClient for TimeoutAnalyzer {
    async fn analyze(&self, _kind: MediaKind, _encoded: &str, _mime: &str) -> content_studio::Result<AnalysisResult> {
        Err(StudioError::transport(TransportKind::Timeout, "deadline exceeded"))
    }
}

/// Generator that records every instruction it receives
#[derive(Default)]
struct RecordingGenerator {
    instructions: Mutex<Vec<String>>,
}

#[async_trait]
impl ContentClient for RecordingGenerator {
    async fn generate_content(
        &self,
        analysis: &AnalysisResult,
        audience: Audience,
        instruction: &str,
    ) -> content_studio::Result<GeneratedContent> {
        self.instructions.lock().unwrap().push(instruction.to_string());
        Ok(GeneratedContent {
            result: SocialContentResult {
                goal_summary: "Show the class in action".to_string(),
                title: format!("{} title", audience),
                caption: "Caption".to_string(),
                hashtags: vec!["#english".to_string()],
                suggested_image_ideas: "Close-up of students".to_string(),
                optimal_post_time: "Friday 19:00".to_string(),
                optimization_tips: vec!["Add a question".to_string()],
                implementation_notes: vec!["Crop to 4:5".to_string()],
            },
            prompt: prompts::content_prompt(analysis, audience, instruction),
        })
    }
}

struct Harness {
    organ: StudioOrgan,
    previews: Arc<ObjectUrlRegistry>,
    generator: Arc<RecordingGenerator>,
    dir: TempDir,
}

fn harness_with(analyzer: Arc<dyn AnalysisClient>) -> Harness {
    let previews = ObjectUrlRegistry::new();
    let generator = Arc::new(RecordingGenerator::default());
    let studio = Studio::new(
        StudioConfig::default(),
        analyzer,
        generator.clone(),
        previews.clone(),
    );

    Harness {
        organ: StudioOrgan::new(Arc::new(studio)),
        previews,
        generator,
        dir: TempDir::new().unwrap(),
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(StubAnalyzer))
}

impl Harness {
    fn write_png(&self, name: &str, body_len: usize) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend(std::iter::repeat(0u8).take(body_len));
        fs::write(&path, bytes).unwrap();
        path
    }

    async fn call(&self, op: &str, input: Value) -> Response {
        self.organ.stimulate(create_stimulus(op, input)).await.unwrap()
    }

    async fn submit(&self, paths: &[PathBuf]) -> Value {
        let paths: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        let response = self.call("media.submit", json!({ "paths": paths })).await;
        assert!(response.ok);
        response.output
    }

    /// Submit one PNG and analyze it, returning its id
    async fn analyzed_png(&self, name: &str) -> String {
        let path = self.write_png(name, 4096);
        let report = self.submit(&[path]).await;
        let id = report["accepted"][0].as_str().unwrap().to_string();
        let response = self.call("media.analyze", json!({ "id": id })).await;
        assert!(response.ok);
        assert_eq!(response.output["status"], "success");
        id
    }
}

/// Helper to create a test stimulus
fn create_stimulus(op: &str, input: Value) -> Stimulus {
    Stimulus {
        op: op.to_string(),
        input,
        context: HashMap::new(),
    }
}

#[tokio::test]
async fn test_studio_capabilities() {
    let h = harness();
    let response = h.call("studio.capabilities", json!({})).await;

    assert!(response.ok);
    assert_eq!(response.output["name"].as_str().unwrap(), "content_studio");

    let names: Vec<&str> = response.output["functions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    for op in [
        "media.submit",
        "media.analyze",
        "media.analyze_pending",
        "content.generate",
        "content.regenerate",
        "content.feedback",
        "media.remove",
        "media.clear",
        "media.snapshot",
        "studio.report",
    ] {
        assert!(names.contains(&op), "missing {}", op);
    }
}

#[tokio::test]
async fn test_organ_describe() {
    let card = harness().organ.describe();

    assert_eq!(card.name, "content_studio");
    assert_eq!(card.division, "media");
    assert_eq!(card.subsystem, "content-generation");
    assert!(card.execution_modes.contains(&"embedded".to_string()));
    assert!(card.execution_modes.contains(&"sidecar".to_string()));
    assert_eq!(card.functions.len(), 12);
}

#[tokio::test]
async fn test_unsupported_operation() {
    let response = harness().call("invalid.operation", json!({})).await;

    assert!(!response.ok);
    assert!(response.output["error"].as_str().unwrap().contains("Unsupported"));
}

#[tokio::test]
async fn test_missing_required_input() {
    let response = harness().call("content.generate", json!({ "id": "x" })).await;

    assert!(!response.ok);
    assert!(response.output["message"].as_str().is_some());
}

#[tokio::test]
async fn test_image_analysis_and_generation() {
    let h = harness();
    let id = h.analyzed_png("poster.png").await;

    let item = h.call("media.snapshot", json!({})).await.output["items"][0].clone();
    assert_eq!(item["id"], id.as_str());
    assert_eq!(item["kind"], "image");
    assert_eq!(item["result"]["description"], "A");
    assert_eq!(item["result"]["textInImage"], "B");
    assert_eq!(item["content"]["kids"]["status"], "idle");
    assert_eq!(item["content"]["mg"]["status"], "idle");

    let response = h
        .call("content.generate", json!({ "id": id, "audience": "kids" }))
        .await;
    assert!(response.ok);
    assert_eq!(response.output["status"], "success");
    assert_eq!(response.output["slot"]["result"]["title"], "kids title");
    let prompt = response.output["slot"]["prompt_sent"].as_str().unwrap();
    assert!(prompt.contains("Description: A"));
    assert!(prompt.contains("Text in image: B"));

    let item = h.call("media.snapshot", json!({})).await.output["items"][0].clone();
    assert_eq!(item["content"]["mg"]["status"], "idle");
    assert_eq!(h.generator.instructions.lock().unwrap().as_slice(), [""]);
}

#[tokio::test]
async fn test_upload_validation_is_per_file() {
    let h = harness();
    let good = h.write_png("ok.png", 16);

    let text = h.dir.path().join("notes.txt");
    fs::write(&text, "plain text notes\n").unwrap();

    let big = h.dir.path().join("huge.png");
    let file = fs::File::create(&big).unwrap();
    file.set_len(51 * 1024 * 1024).unwrap();

    let report = h.submit(&[text, good, big]).await;
    assert_eq!(report["accepted"].as_array().unwrap().len(), 1);

    let rejected = report["rejected"].as_array().unwrap();
    assert_eq!(rejected.len(), 2);
    let messages: Vec<&str> = rejected.iter().map(|r| r["message"].as_str().unwrap()).collect();
    assert!(messages.iter().any(|m| m.contains("notes.txt") && m.contains("unsupported")));
    assert!(messages.iter().any(|m| m.contains("huge.png") && m.contains("50MB")));

    let snapshot = h.call("media.snapshot", json!({})).await;
    assert_eq!(snapshot.output["pending"], 1);
    assert_eq!(h.previews.live_count(), 1);
}

#[tokio::test]
async fn test_feedback_loop_regenerates_with_critique() {
    let h = harness();
    let id = h.analyzed_png("class.png").await;

    h.call("content.generate", json!({ "id": id, "audience": "mg" })).await;
    let response = h
        .call(
            "content.feedback",
            json!({ "id": id, "audience": "mg", "rating": 3, "feedback_text": "too long" }),
        )
        .await;
    assert!(response.ok);

    let item = h.call("media.snapshot", json!({})).await.output["items"][0].clone();
    assert_eq!(item["content"]["mg"]["rating"], 3);
    assert_eq!(item["content"]["mg"]["feedback_text"], "too long");

    let response = h
        .call(
            "content.regenerate",
            json!({ "id": id, "audience": "mg", "request": "make it shorter" }),
        )
        .await;
    assert!(response.ok);
    assert_eq!(response.output["status"], "success");

    let instructions = h.generator.instructions.lock().unwrap().clone();
    assert_eq!(instructions.len(), 2);
    assert!(instructions[1].contains("3/10"));
    assert!(instructions[1].contains("\"too long\""));
    assert!(instructions[1].contains("\"make it shorter\""));

    let slot = &response.output["slot"];
    assert!(slot["prompt_sent"].as_str().unwrap().contains("make it shorter"));
    assert!(slot["rating"].is_null());
    assert!(slot["feedback_text"].is_null());
}

#[tokio::test]
async fn test_rating_only_regeneration() {
    let h = harness();
    let id = h.analyzed_png("class.png").await;

    h.call("content.generate", json!({ "id": id, "audience": "kids" })).await;
    h.call("content.feedback", json!({ "id": id, "audience": "kids", "rating": 9 }))
        .await;
    h.call("content.regenerate", json!({ "id": id, "audience": "kids" })).await;

    let instructions = h.generator.instructions.lock().unwrap().clone();
    assert_eq!(
        instructions[1],
        "The user rated the previous version 9/10. Please produce another version based on that rating."
    );
}

#[tokio::test]
async fn test_feedback_rules() {
    let h = harness();
    let id = h.analyzed_png("class.png").await;

    // Nothing generated yet
    let response = h
        .call("content.feedback", json!({ "id": id, "audience": "kids", "rating": 5 }))
        .await;
    assert!(!response.ok);
    assert_eq!(response.output["error"], "InvalidState");

    h.call("content.generate", json!({ "id": id, "audience": "kids" })).await;
    for rating in [0, 11] {
        let response = h
            .call("content.feedback", json!({ "id": id, "audience": "kids", "rating": rating }))
            .await;
        assert!(!response.ok);
        assert_eq!(response.output["error"], "ValidationError");
    }

    let response = h
        .call("content.feedback", json!({ "id": "missing", "audience": "kids", "rating": 5 }))
        .await;
    assert_eq!(response.output["error"], "NotFound");
}

#[tokio::test]
async fn test_generate_requires_successful_analysis() {
    let h = harness();
    let path = h.write_png("raw.png", 16);
    let id = h.submit(&[path]).await["accepted"][0].as_str().unwrap().to_string();

    let response = h
        .call("content.generate", json!({ "id": id, "audience": "kids" }))
        .await;
    assert!(!response.ok);
    assert_eq!(response.output["error"], "InvalidState");
    assert!(h.generator.instructions.lock().unwrap().is_empty());

    let response = h
        .call("content.generate", json!({ "id": id, "audience": "teens" }))
        .await;
    assert_eq!(response.output["error"], "ValidationError");
}

#[tokio::test]
async fn test_analysis_timeout_is_attached_to_item() {
    let h = harness_with(Arc::new(TimeoutAnalyzer));
    let path = h.write_png("slow.png", 16);
    let id = h.submit(&[path]).await["accepted"][0].as_str().unwrap().to_string();

    let response = h.call("media.analyze", json!({ "id": id })).await;
    assert!(response.ok);
    assert_eq!(response.output["status"], "error");
    assert_eq!(
        response.output["item"]["error"],
        "The analysis took too long. Please try again with a smaller file."
    );
    assert!(response.output["item"]["result"].is_null());
}

#[tokio::test]
async fn test_missing_api_key_surfaces_on_item() {
    let config = StudioConfig {
        api_base: "http://127.0.0.1:9".to_string(),
        api_key_env: "CONTENT_STUDIO_INTEGRATION_NO_KEY".to_string(),
        ..StudioConfig::default()
    };
    let organ = StudioOrgan::new(Arc::new(Studio::with_gemini(config).unwrap()));
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.png");
    fs::write(&path, PNG_SIGNATURE).unwrap();

    let report = organ
        .stimulate(create_stimulus("media.submit", json!({ "paths": [path.display().to_string()] })))
        .await
        .unwrap();
    let id = report.output["accepted"][0].as_str().unwrap().to_string();

    let response = organ
        .stimulate(create_stimulus("media.analyze", json!({ "id": id })))
        .await
        .unwrap();
    assert_eq!(response.output["status"], "error");
    assert!(response.output["item"]["error"]
        .as_str()
        .unwrap()
        .contains("CONTENT_STUDIO_INTEGRATION_NO_KEY"));
}

#[tokio::test]
async fn test_analyze_pending_out_of_order_completion() {
    let h = harness();
    // The small file answers last
    let slow = h.write_png("slow.png", 16);
    let fast = h.write_png("fast.png", 8192);
    let report = h.submit(&[slow, fast]).await;
    let ids: Vec<String> = report["accepted"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();

    let response = h.call("media.analyze_pending", json!({})).await;
    assert!(response.ok);
    assert_eq!(response.output["dispatched"], 2);

    let snapshot = h.call("media.snapshot", json!({})).await.output;
    assert_eq!(snapshot["pending"], 0);
    let items = snapshot["items"].as_array().unwrap();
    assert_eq!(items[0]["id"], ids[0].as_str());
    assert_eq!(items[1]["id"], ids[1].as_str());
    assert!(items.iter().all(|item| item["status"] == "success"));

    // Nothing left to dispatch
    let response = h.call("media.analyze_pending", json!({})).await;
    assert_eq!(response.output["dispatched"], 0);
}

#[tokio::test]
async fn test_concurrent_audiences() {
    let h = harness();
    let id = h.analyzed_png("class.png").await;

    let (kids, mg) = tokio::join!(
        h.call("content.generate", json!({ "id": id, "audience": "kids" })),
        h.call("content.generate", json!({ "id": id, "audience": "mg", "feedback": "formal tone" })),
    );
    assert_eq!(kids.output["slot"]["result"]["title"], "kids title");
    assert_eq!(mg.output["slot"]["result"]["title"], "mg title");
    assert!(mg.output["slot"]["prompt_sent"].as_str().unwrap().contains("formal tone"));
}

#[tokio::test]
async fn test_remove_and_clear_release_previews() {
    let h = harness();
    let a = h.write_png("a.png", 16);
    let b = h.write_png("b.png", 32);
    let c = h.write_png("c.png", 64);
    let report = h.submit(&[a, b, c]).await;
    let first = report["accepted"][0].as_str().unwrap().to_string();
    assert_eq!(h.previews.live_count(), 3);

    let response = h.call("media.remove", json!({ "id": first })).await;
    assert_eq!(response.output["removed"], true);
    assert_eq!(h.previews.live_count(), 2);

    let response = h.call("media.remove", json!({ "id": first })).await;
    assert_eq!(response.output["removed"], false);

    let response = h.call("media.clear", json!({})).await;
    assert_eq!(response.output["removed"], 2);
    assert_eq!(h.previews.live_count(), 0);
    assert_eq!(h.previews.released_count(), 3);

    let snapshot = h.call("media.snapshot", json!({})).await;
    assert!(snapshot.output["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_developer_report() {
    let h = harness();
    let report = h.call("studio.report", json!({})).await;
    assert!(report.output["report"].as_str().unwrap().contains("No files have been uploaded yet."));

    let id = h.analyzed_png("poster.png").await;
    h.call("content.generate", json!({ "id": id, "audience": "kids" })).await;

    let report = h.call("studio.report", json!({})).await;
    let text = report.output["report"].as_str().unwrap();
    assert!(text.contains("poster.png"));
    assert!(text.contains("image/png"));
    assert!(text.contains("Content (kids): Success"));
    assert!(text.contains("Prompt sent:"));
    assert!(!text.contains("Content (mg)"));
}

#[tokio::test]
async fn test_metrics_track_operations() {
    let h = harness();
    let id = h.analyzed_png("poster.png").await;
    h.call("content.generate", json!({ "id": id, "audience": "kids" })).await;
    h.call("invalid.operation", json!({})).await;

    let response = h.call("metrics", json!({})).await;
    assert!(response.ok);
    let operations = &response.output["operations"];
    assert_eq!(operations["media.submit"]["requests"], 1);
    assert_eq!(operations["media.analyze"]["requests"], 1);
    assert_eq!(operations["content.generate"]["requests"], 1);
    assert_eq!(operations["unsupported"]["failures"], 1);
    assert!(operations.get("invalid.operation").is_none());
    assert_eq!(response.output["failed_requests"], 1);
}
