//! Uploaded media files: loading, mime sniffing, upload validation, transport encoding

use crate::error::{Result, StudioError};
use crate::model::MediaKind;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Raw bytes plus mime type. Cheap to clone, never mutated.
#[derive(Clone)]
pub struct MediaFile {
    name: String,
    mime_type: String,
    modified: DateTime<Utc>,
    bytes: Arc<[u8]>,
}

impl MediaFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        modified: DateTime<Utc>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            modified,
            bytes: bytes.into(),
        }
    }

    /// Load a file from disk, sniffing its mime type from content.
    ///
    /// Files larger than `max_bytes` are rejected from metadata alone, before reading.
    pub async fn load(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let metadata = tokio::fs::metadata(path).await?;
        if metadata.len() > max_bytes {
            return Err(oversize_error(&name, max_bytes));
        }
        let modified: DateTime<Utc> = metadata.modified()?.into();

        let bytes = tokio::fs::read(path).await?;
        let mime_type = sniff_mime(&bytes);
        debug!(file = %name, mime = %mime_type, size = bytes.len(), "Loaded media file");

        Ok(Self::new(name, mime_type, modified, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Stable identity: the same file (name, mtime, size) always yields the same id
    pub fn item_id(&self) -> String {
        format!(
            "{}-{}-{}",
            self.name,
            self.modified.timestamp_millis(),
            self.size()
        )
    }

    /// Base64 payload for inline transport to the provider
    pub fn encode_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }
}

impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("modified", &self.modified)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Check size and type limits for an upload; returns the media kind on success
pub fn validate_upload(file: &MediaFile, max_bytes: u64) -> Result<MediaKind> {
    if file.size() > max_bytes {
        return Err(oversize_error(file.name(), max_bytes));
    }

    MediaKind::from_mime(file.mime_type()).ok_or_else(|| {
        StudioError::Validation(format!(
            "File \"{}\" has an unsupported format ({}). Please choose a video or an image.",
            file.name(),
            file.mime_type()
        ))
    })
}

fn oversize_error(name: &str, max_bytes: u64) -> StudioError {
    StudioError::Validation(format!(
        "File \"{}\" is too large. Please choose a file smaller than {}MB.",
        name,
        max_bytes / (1024 * 1024)
    ))
}

/// Detect mime type from magic numbers, falling back to tree_magic
pub fn sniff_mime(bytes: &[u8]) -> String {
    match infer::get(bytes) {
        Some(kind) => kind.mime_type().to_string(),
        None => tree_magic_mini::from_u8(bytes).to_string(),
    }
}
