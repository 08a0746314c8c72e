//! Media item store
//!
//! The single authoritative, ordered collection of [`MediaItem`]s. All mutation goes through
//! the narrow operations here; each is a synchronous state transition keyed by item id (and
//! audience for content slots). Ids are not unique: identical uploads share one and every
//! transition applies to all of them.
//!
//! Remote calls are split into a `begin_*` transition that hands out a ticket and a
//! `complete_*` transition that applies the outcome. A completion is applied only if the
//! item still exists and the slot still carries the same ticket, so late results for removed
//! items are dropped.

use crate::client::GeneratedContent;
use crate::error::{Result, StudioError};
use crate::media::{validate_upload, MediaFile};
use crate::model::{
    AnalysisResult, AnalysisState, AnalysisStatus, Audience, AudienceSlots, ContentSlot,
    ContentView, MediaKind, Rating, SlotState, SlotStatus,
};
use crate::preview::{PreviewHandle, PreviewProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One uploaded file and everything derived from it
#[derive(Debug)]
pub struct MediaItem {
    id: String,
    file: MediaFile,
    kind: MediaKind,
    preview: PreviewHandle,
    analysis: AnalysisState,
    analysis_ticket: Option<u64>,
    content: AudienceSlots,
}

impl MediaItem {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn file(&self) -> &MediaFile {
        &self.file
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn preview(&self) -> &str {
        self.preview.locator()
    }

    pub fn analysis(&self) -> &AnalysisState {
        &self.analysis
    }

    pub fn status(&self) -> AnalysisStatus {
        self.analysis.status()
    }

    pub fn slot(&self, audience: Audience) -> &ContentSlot {
        self.content.get(audience)
    }

    pub fn view(&self) -> ItemView {
        ItemView {
            id: self.id.clone(),
            name: self.file.name().to_string(),
            mime_type: self.file.mime_type().to_string(),
            size: self.file.size(),
            kind: self.kind,
            preview: self.preview.locator().to_string(),
            status: self.analysis.status(),
            result: self.analysis.result().cloned(),
            error: self.analysis.error().map(str::to_string),
            content: ContentView {
                kids: self.content.kids.view(),
                mg: self.content.mg.view(),
            },
        }
    }
}

/// Serializable snapshot of one item for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub kind: MediaKind,
    pub preview: String,
    pub status: AnalysisStatus,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    pub content: ContentView,
}

/// A file that failed upload validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<Rejection>,
}

/// Issued by [`MediaStore::begin_analysis`]; carries everything the remote call needs
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub item_id: String,
    pub kind: MediaKind,
    pub file: MediaFile,
    seq: u64,
}

/// Issued by [`MediaStore::begin_generation`]
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub item_id: String,
    pub audience: Audience,
    pub analysis: AnalysisResult,
    pub instruction: String,
    seq: u64,
}

pub struct MediaStore {
    items: Vec<MediaItem>,
    previews: Arc<dyn PreviewProvider>,
    max_file_size_bytes: u64,
    next_ticket: u64,
}

impl MediaStore {
    pub fn new(previews: Arc<dyn PreviewProvider>, max_file_size_bytes: u64) -> Self {
        Self {
            items: Vec::new(),
            previews,
            max_file_size_bytes,
            next_ticket: 0,
        }
    }

    /// Validate a file and append it as a `pending` item with both slots `idle`
    pub fn submit(&mut self, file: MediaFile) -> Result<String> {
        let kind = validate_upload(&file, self.max_file_size_bytes)?;
        let id = file.item_id();
        let preview = PreviewHandle::acquire(Arc::clone(&self.previews), &file);

        debug!(item = %id, kind = kind.as_str(), "Media item submitted");
        self.items.push(MediaItem {
            id: id.clone(),
            file,
            kind,
            preview,
            analysis: AnalysisState::Pending,
            analysis_ticket: None,
            content: AudienceSlots::default(),
        });
        Ok(id)
    }

    /// Submit a batch; invalid files are reported and do not affect the rest
    pub fn submit_batch(&mut self, files: impl IntoIterator<Item = MediaFile>) -> SubmitReport {
        let mut report = SubmitReport::default();
        for file in files {
            let name = file.name().to_string();
            match self.submit(file) {
                Ok(id) => report.accepted.push(id),
                Err(e) => {
                    warn!(file = %name, "Upload rejected: {}", e);
                    report.rejected.push(Rejection {
                        file: name,
                        message: e.user_message(),
                    });
                }
            }
        }
        report
    }

    pub fn get(&self, id: &str) -> Option<&MediaItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Every item carrying `id`; identical uploads share an id and move together
    fn matching_mut<'a>(&'a mut self, id: &'a str) -> impl Iterator<Item = &'a mut MediaItem> + 'a {
        self.items.iter_mut().filter(move |item| item.id == id)
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct ids with at least one `pending` item, in upload order
    pub fn pending_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for item in self.items.iter().filter(|item| item.status() == AnalysisStatus::Pending) {
            if !ids.contains(&item.id) {
                ids.push(item.id.clone());
            }
        }
        ids
    }

    pub fn pending_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status() == AnalysisStatus::Pending)
            .count()
    }

    pub fn slot(&self, id: &str, audience: Audience) -> Option<&ContentSlot> {
        self.get(id).map(|item| item.slot(audience))
    }

    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Move every item with `id` to `loading`. Callers should gate on `pending`; any state
    /// restarts the cycle.
    pub fn begin_analysis(&mut self, id: &str) -> Option<AnalysisTicket> {
        let seq = self.issue_ticket();
        let mut ticket = None;

        for item in self.matching_mut(id) {
            item.analysis = AnalysisState::Loading;
            item.analysis_ticket = Some(seq);
            ticket.get_or_insert_with(|| AnalysisTicket {
                item_id: item.id.clone(),
                kind: item.kind,
                file: item.file.clone(),
                seq,
            });
        }
        ticket
    }

    /// Apply an analysis outcome. Returns false if the ticket is stale (item removed or re-triggered).
    pub fn complete_analysis(
        &mut self,
        ticket: &AnalysisTicket,
        outcome: Result<AnalysisResult>,
    ) -> bool {
        let state = match outcome {
            Ok(result) if result.kind() == ticket.kind => AnalysisState::Success(result),
            Ok(result) => AnalysisState::Error(
                StudioError::Schema(format!(
                    "expected {} analysis, got {}",
                    ticket.kind.as_str(),
                    result.kind().as_str()
                ))
                .user_message(),
            ),
            Err(e) => AnalysisState::Error(e.user_message()),
        };

        let mut applied = 0;
        for item in self.matching_mut(&ticket.item_id) {
            if item.analysis_ticket != Some(ticket.seq) {
                continue;
            }
            item.analysis_ticket = None;
            item.analysis = state.clone();
            applied += 1;
        }

        if applied == 0 {
            debug!(item = %ticket.item_id, "Analysis finished for removed or re-triggered item, ignoring");
            return false;
        }
        match &state {
            AnalysisState::Success(_) => info!(item = %ticket.item_id, applied, "✓ Analysis complete"),
            _ => warn!(item = %ticket.item_id, "Analysis failed: {}", state.error().unwrap_or_default()),
        }
        true
    }

    /// Move the slot of every analyzed item with `id` to `loading`. No-op (None) unless an
    /// analysis succeeded.
    ///
    /// The previous prompt and rating stay on the slot until a new success replaces them.
    pub fn begin_generation(
        &mut self,
        id: &str,
        audience: Audience,
        instruction: impl Into<String>,
    ) -> Option<GenerationTicket> {
        let analysis = self
            .items
            .iter()
            .filter(|item| item.id == id)
            .find_map(|item| item.analysis.result().cloned());
        let Some(analysis) = analysis else {
            debug!(item = %id, audience = %audience, "Generation skipped: analysis not ready");
            return None;
        };

        let seq = self.issue_ticket();
        for item in self.matching_mut(id) {
            if item.analysis.result().is_none() {
                continue;
            }
            let slot = item.content.get_mut(audience);
            slot.state = SlotState::Loading;
            slot.ticket = Some(seq);
        }

        Some(GenerationTicket {
            item_id: id.to_string(),
            audience,
            analysis,
            instruction: instruction.into(),
            seq,
        })
    }

    /// Apply a generation outcome. Returns false if the ticket is stale.
    ///
    /// A fresh success clears any rating and feedback saved for the previous result.
    pub fn complete_generation(
        &mut self,
        ticket: &GenerationTicket,
        outcome: Result<GeneratedContent>,
    ) -> bool {
        let outcome = outcome.map_err(|e| e.user_message());

        let mut applied = 0;
        for item in self.matching_mut(&ticket.item_id) {
            let slot = item.content.get_mut(ticket.audience);
            if slot.ticket != Some(ticket.seq) {
                continue;
            }
            slot.ticket = None;

            match &outcome {
                Ok(generated) => {
                    slot.state = SlotState::Success(generated.result.clone());
                    slot.prompt_sent = Some(generated.prompt.clone());
                    slot.rating = None;
                    slot.feedback_text = None;
                }
                Err(message) => slot.state = SlotState::Error(message.clone()),
            }
            applied += 1;
        }

        if applied == 0 {
            debug!(item = %ticket.item_id, audience = %ticket.audience, "Generation finished for removed or re-triggered slot, ignoring");
            return false;
        }
        match &outcome {
            Ok(_) => info!(item = %ticket.item_id, audience = %ticket.audience, "✓ Content generated"),
            Err(message) => warn!(item = %ticket.item_id, audience = %ticket.audience, "Generation failed: {}", message),
        }
        true
    }

    /// Record the user's rating and critique for the slot's current result
    pub fn save_feedback(
        &mut self,
        id: &str,
        audience: Audience,
        rating: Rating,
        feedback_text: Option<String>,
    ) -> Result<()> {
        if self.get(id).is_none() {
            return Err(StudioError::NotFound(id.to_string()));
        }
        let feedback_text = feedback_text.filter(|text| !text.trim().is_empty());

        let mut saved = false;
        for item in self.matching_mut(id) {
            let slot = item.content.get_mut(audience);
            if slot.status() == SlotStatus::Success {
                slot.rating = Some(rating);
                slot.feedback_text = feedback_text.clone();
                saved = true;
            }
        }

        if !saved {
            return Err(StudioError::InvalidState(format!(
                "No generated {} content to rate for {}",
                audience, id
            )));
        }
        debug!(item = %id, audience = %audience, rating = rating.value(), "Feedback saved");
        Ok(())
    }

    /// Remove every item with `id`, releasing their previews. Returns false if absent.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            info!(item = %id, "Media item removed");
        }
        removed
    }

    /// Remove every item, releasing all previews. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        info!(count, "Cleared all media items");
        count
    }

    pub fn snapshot(&self) -> Vec<ItemView> {
        self.items.iter().map(MediaItem::view).collect()
    }
}
