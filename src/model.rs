//! Core data model: media kinds, analysis results, generated content, per-audience slots

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Media kind, fixed at creation from the mime type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Classify a mime type; anything other than `video/*` or `image/*` is unsupported
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        if mime_type.starts_with("video/") {
            Some(MediaKind::Video)
        } else if mime_type.starts_with("image/") {
            Some(MediaKind::Image)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

/// The two fixed content personas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    /// Parents of young children
    Kids,
    /// Working professionals and students
    Mg,
}

impl Audience {
    pub const ALL: [Audience; 2] = [Audience::Kids, Audience::Mg];

    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Kids => "kids",
            Audience::Mg => "mg",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "kids" => Ok(Audience::Kids),
            "mg" => Ok(Audience::Mg),
            other => Err(StudioError::Validation(format!(
                "Unknown audience '{}': expected 'kids' or 'mg'",
                other
            ))),
        }
    }
}

/// Output of the analysis stage, discriminated by media kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisResult {
    Video {
        transcript: String,
        description: String,
    },
    Image {
        description: String,
        #[serde(rename = "textInImage")]
        text_in_image: String,
    },
}

impl AnalysisResult {
    pub fn kind(&self) -> MediaKind {
        match self {
            AnalysisResult::Video { .. } => MediaKind::Video,
            AnalysisResult::Image { .. } => MediaKind::Image,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            AnalysisResult::Video { description, .. } | AnalysisResult::Image { description, .. } => {
                description
            }
        }
    }
}

/// Social post draft returned by the generation stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocialContentResult {
    pub goal_summary: String,
    pub title: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub suggested_image_ideas: String,
    pub optimal_post_time: String,
    pub optimization_tips: Vec<String>,
    pub implementation_notes: Vec<String>,
}

/// User quality score, 1 to 10 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Result<Self> {
        if (1..=10).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(StudioError::Validation(format!(
                "Rating must be between 1 and 10, got {}",
                value
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = StudioError;

    fn try_from(value: u8) -> Result<Self> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Analysis state machine; the result/error exclusivity holds by construction
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    Pending,
    Loading,
    Success(AnalysisResult),
    Error(String),
}

impl AnalysisState {
    pub fn status(&self) -> AnalysisStatus {
        match self {
            AnalysisState::Pending => AnalysisStatus::Pending,
            AnalysisState::Loading => AnalysisStatus::Loading,
            AnalysisState::Success(_) => AnalysisStatus::Success,
            AnalysisState::Error(_) => AnalysisStatus::Error,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AnalysisState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Generation state machine for one audience slot
#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    Idle,
    Loading,
    Success(SocialContentResult),
    Error(String),
}

impl SlotState {
    pub fn status(&self) -> SlotStatus {
        match self {
            SlotState::Idle => SlotStatus::Idle,
            SlotState::Loading => SlotStatus::Loading,
            SlotState::Success(_) => SlotStatus::Success,
            SlotState::Error(_) => SlotStatus::Error,
        }
    }
}

/// One audience's generation history for one item
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSlot {
    pub state: SlotState,
    /// Exact instruction text last sent, kept for diagnostics
    pub prompt_sent: Option<String>,
    pub rating: Option<Rating>,
    pub feedback_text: Option<String>,
    pub(crate) ticket: Option<u64>,
}

impl Default for ContentSlot {
    fn default() -> Self {
        Self {
            state: SlotState::Idle,
            prompt_sent: None,
            rating: None,
            feedback_text: None,
            ticket: None,
        }
    }
}

impl ContentSlot {
    pub fn status(&self) -> SlotStatus {
        self.state.status()
    }

    pub fn result(&self) -> Option<&SocialContentResult> {
        match &self.state {
            SlotState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SlotState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn view(&self) -> SlotView {
        SlotView {
            status: self.status(),
            result: self.result().cloned(),
            prompt_sent: self.prompt_sent.clone(),
            error: self.error().map(str::to_string),
            rating: self.rating,
            feedback_text: self.feedback_text.clone(),
        }
    }
}

/// Exactly two slots, one per [`Audience`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudienceSlots {
    pub kids: ContentSlot,
    pub mg: ContentSlot,
}

impl AudienceSlots {
    pub fn get(&self, audience: Audience) -> &ContentSlot {
        match audience {
            Audience::Kids => &self.kids,
            Audience::Mg => &self.mg,
        }
    }

    pub fn get_mut(&mut self, audience: Audience) -> &mut ContentSlot {
        match audience {
            Audience::Kids => &mut self.kids,
            Audience::Mg => &mut self.mg,
        }
    }
}

/// Flat, presentation-facing view of a slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotView {
    pub status: SlotStatus,
    pub result: Option<SocialContentResult>,
    pub prompt_sent: Option<String>,
    pub error: Option<String>,
    pub rating: Option<Rating>,
    pub feedback_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentView {
    pub kids: SlotView,
    pub mg: SlotView,
}
