//! Studio configuration
//!
//! Everything here is non-secret. The provider credential is read from the process
//! environment on every remote call (see [`StudioConfig::resolve_api_key`]).

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";
pub const MAX_FILE_SIZE_MB: u64 = 50;
pub const MAX_FILE_SIZE_BYTES: u64 = MAX_FILE_SIZE_MB * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Provider REST base, without trailing slash
    pub api_base: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub max_file_size_bytes: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
        }
    }
}

impl StudioConfig {
    /// Read the API key from the environment. Missing or blank is a configuration error.
    pub fn resolve_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(StudioError::Configuration(format!(
                "API key not found. Please set the {} environment variable.",
                self.api_key_env
            ))),
        }
    }

    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_bytes / (1024 * 1024)
    }
}
