//! Remote model boundaries
//!
//! The studio only talks to the generative model through these two traits. The production
//! implementation is [`crate::gemini::GeminiClient`]; tests plug in stubs.

use crate::error::Result;
use crate::model::{AnalysisResult, Audience, MediaKind, SocialContentResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Turns raw media into a structured [`AnalysisResult`]
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// `encoded` is the base64 file payload. The returned variant must match `kind`.
    async fn analyze(&self, kind: MediaKind, encoded: &str, mime_type: &str) -> Result<AnalysisResult>;
}

/// Drafts a social post for one audience
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// `instruction` may be empty (first generation, no feedback)
    async fn generate_content(
        &self,
        analysis: &AnalysisResult,
        audience: Audience,
        instruction: &str,
    ) -> Result<GeneratedContent>;
}

/// Generated draft plus the exact prompt text transmitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub result: SocialContentResult,
    pub prompt: String,
}
