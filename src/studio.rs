//! Async orchestration over the media store
//!
//! [`Studio`] pairs a [`MediaStore`] with the two model clients. Every operation takes the
//! store lock only for the synchronous begin/complete transitions and never across a remote
//! call, so analyses and generations for different items (or audiences) overlap freely and
//! their completions land on the right item regardless of order.

use crate::client::{AnalysisClient, ContentClient};
use crate::config::StudioConfig;
use crate::error::Result;
use crate::feedback;
use crate::gemini::GeminiClient;
use crate::media::MediaFile;
use crate::model::{AnalysisStatus, Audience, Rating, SlotStatus};
use crate::preview::{ObjectUrlRegistry, PreviewProvider};
use crate::report;
use crate::store::{ItemView, MediaStore, Rejection, SubmitReport};
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct Studio {
    store: Mutex<MediaStore>,
    analyzer: Arc<dyn AnalysisClient>,
    generator: Arc<dyn ContentClient>,
    config: StudioConfig,
}

impl Studio {
    pub fn new(
        config: StudioConfig,
        analyzer: Arc<dyn AnalysisClient>,
        generator: Arc<dyn ContentClient>,
        previews: Arc<dyn PreviewProvider>,
    ) -> Self {
        Self {
            store: Mutex::new(MediaStore::new(previews, config.max_file_size_bytes)),
            analyzer,
            generator,
            config,
        }
    }

    /// Studio backed by the Gemini REST client and in-process preview locators
    pub fn with_gemini(config: StudioConfig) -> Result<Self> {
        let client = Arc::new(GeminiClient::new(config.clone())?);
        Ok(Self::new(
            config,
            client.clone(),
            client,
            ObjectUrlRegistry::new(),
        ))
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub async fn submit(&self, file: MediaFile) -> Result<String> {
        self.store.lock().await.submit(file)
    }

    pub async fn submit_batch(&self, files: Vec<MediaFile>) -> SubmitReport {
        self.store.lock().await.submit_batch(files)
    }

    /// Load files from disk and submit them; unreadable files are reported like invalid ones
    pub async fn submit_paths(&self, paths: &[PathBuf]) -> SubmitReport {
        let mut loaded = Vec::new();
        let mut rejected = Vec::new();

        for path in paths {
            match MediaFile::load(path, self.config.max_file_size_bytes).await {
                Ok(file) => loaded.push(file),
                Err(e) => rejected.push(Rejection {
                    file: path.display().to_string(),
                    message: e.user_message(),
                }),
            }
        }

        let mut report = self.submit_batch(loaded).await;
        report.rejected.extend(rejected);
        info!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            "Upload batch processed"
        );
        report
    }

    /// Run analysis for one item. Returns the item's status afterwards, or None if it is gone.
    pub async fn analyze(&self, id: &str) -> Option<AnalysisStatus> {
        let ticket = self.store.lock().await.begin_analysis(id)?;

        let start = Instant::now();
        let encoded = ticket.file.encode_base64();
        debug!(item = %ticket.item_id, encoded_len = encoded.len(), "Dispatching analysis");
        let outcome = self
            .analyzer
            .analyze(ticket.kind, &encoded, ticket.file.mime_type())
            .await;
        debug!(
            item = %ticket.item_id,
            latency_ms = start.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "Analysis returned"
        );

        let mut store = self.store.lock().await;
        store.complete_analysis(&ticket, outcome);
        store.get(id).map(|item| item.status())
    }

    /// Analyze every `pending` item concurrently
    pub async fn analyze_pending(&self) -> Vec<(String, Option<AnalysisStatus>)> {
        let ids = self.store.lock().await.pending_ids();
        info!(count = ids.len(), "Analyzing pending items");

        let futures = ids.iter().map(|id| self.analyze(id));
        let statuses = join_all(futures).await;
        ids.into_iter().zip(statuses).collect()
    }

    /// Generate content for one slot with an explicit instruction (empty for none).
    ///
    /// Returns None without touching the slot if the item is gone or not yet analyzed.
    pub async fn generate(&self, id: &str, audience: Audience, instruction: Option<&str>) -> Option<SlotStatus> {
        let ticket = self
            .store
            .lock()
            .await
            .begin_generation(id, audience, instruction.unwrap_or_default())?;

        let start = Instant::now();
        let outcome = self
            .generator
            .generate_content(&ticket.analysis, audience, &ticket.instruction)
            .await;
        debug!(
            item = %id,
            audience = %audience,
            latency_ms = start.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "Generation returned"
        );

        let mut store = self.store.lock().await;
        store.complete_generation(&ticket, outcome);
        store.slot(id, audience).map(|slot| slot.status())
    }

    /// Regenerate, folding the slot's saved rating and critique plus `request` into the instruction
    pub async fn regenerate(&self, id: &str, audience: Audience, request: &str) -> Option<SlotStatus> {
        let instruction = {
            let store = self.store.lock().await;
            let slot = store.slot(id, audience)?;
            feedback::compose_for_slot(slot, request)
        };
        self.generate(id, audience, Some(&instruction)).await
    }

    pub async fn save_feedback(
        &self,
        id: &str,
        audience: Audience,
        rating: u8,
        feedback_text: Option<String>,
    ) -> Result<()> {
        let rating = Rating::new(rating)?;
        self.store
            .lock()
            .await
            .save_feedback(id, audience, rating, feedback_text)
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.store.lock().await.remove(id)
    }

    pub async fn clear(&self) -> usize {
        self.store.lock().await.clear()
    }

    pub async fn pending_count(&self) -> usize {
        self.store.lock().await.pending_count()
    }

    pub async fn snapshot(&self) -> Vec<ItemView> {
        self.store.lock().await.snapshot()
    }

    pub async fn item(&self, id: &str) -> Option<ItemView> {
        self.store.lock().await.get(id).map(|item| item.view())
    }

    /// Developer-mode text report of every item
    pub async fn report(&self) -> String {
        report::render(&self.snapshot().await)
    }
}
