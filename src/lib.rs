//! content_studio - media analysis and social post generation
//!
//! Uploaded videos and images are analyzed by a multimodal model (transcript and
//! description, or description and visible text), then turned into audience-targeted
//! social posts for two personas. Each post can be rated and critiqued, and the critique
//! is folded into the next generation.

pub mod client;
pub mod config;
pub mod error;
pub mod feedback;
pub mod gemini;
pub mod media;
pub mod metrics;
pub mod model;
pub mod organ;
pub mod preview;
pub mod prompts;
pub mod report;
pub mod store;
pub mod studio;
pub mod validation;

pub use client::{AnalysisClient, ContentClient, GeneratedContent};
pub use config::StudioConfig;
pub use error::{Result, StudioError, TransportKind};
pub use media::MediaFile;
pub use model::{
    AnalysisResult, AnalysisStatus, Audience, MediaKind, Rating, SlotStatus, SocialContentResult,
};
pub use preview::{ObjectUrlRegistry, PreviewHandle, PreviewProvider};
pub use store::{ItemView, MediaStore, SubmitReport};
pub use studio::Studio;
