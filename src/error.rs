use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Request exceeded a deadline (client timeout, HTTP 408/504, DEADLINE_EXCEEDED)
    Timeout,
    /// Provider rejected the payload as too large (HTTP 413)
    PayloadTooLarge,
    /// Anything else: connection failures, 4xx/5xx with a provider message
    Other,
}

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error ({kind:?}): {message}")]
    Transport {
        kind: TransportKind,
        message: String,
    },

    #[error("Schema mismatch: {0}")]
    Schema(String),

    #[error("Media item not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StudioError {
    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        StudioError::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Text attached inline to the item or slot that produced this error
    pub fn user_message(&self) -> String {
        match self {
            StudioError::Transport { kind: TransportKind::Timeout, .. } => {
                "The analysis took too long. Please try again with a smaller file.".to_string()
            }
            StudioError::Transport { kind: TransportKind::PayloadTooLarge, .. } => {
                "The file is too large for the model. Please try a smaller file.".to_string()
            }
            StudioError::Transport { kind: TransportKind::Other, message } => {
                format!("Model API error: {}", message)
            }
            // Schema failures are shown like any other provider failure
            StudioError::Schema(_) | StudioError::Json(_) => {
                "Model API error: the response did not match the expected format.".to_string()
            }
            StudioError::Validation(msg)
            | StudioError::Configuration(msg)
            | StudioError::NotFound(msg)
            | StudioError::InvalidState(msg) => msg.clone(),
            StudioError::Io(e) => format!("Could not read file: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_hints() {
        let timeout = StudioError::transport(TransportKind::Timeout, "deadline exceeded");
        assert!(timeout.user_message().contains("too long"));

        let too_large = StudioError::transport(TransportKind::PayloadTooLarge, "413");
        assert!(too_large.user_message().contains("too large"));

        let other = StudioError::transport(TransportKind::Other, "quota exhausted");
        assert_eq!(other.user_message(), "Model API error: quota exhausted");
    }

    #[test]
    fn test_schema_error_is_opaque() {
        let err = StudioError::Schema("Missing required field: title".to_string());
        let msg = err.user_message();
        assert!(msg.starts_with("Model API error"));
        assert!(!msg.contains("title"));
    }

    #[test]
    fn test_configuration_message_passes_through() {
        let err = StudioError::Configuration("API key not found".to_string());
        assert_eq!(err.user_message(), "API key not found");
    }
}
