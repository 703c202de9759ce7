//! Configuration types for Cleverly.
//!
//! Settings live in `cleverly.json` next to where the binary is started.
//! Every field is optional and falls back to a default suited to a
//! locally running generation backend.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CleverlyError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "cleverly.json";

/// Default base URL of the generation backend.
fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

/// Default path of the upload endpoint on the backend.
fn default_upload_path() -> String {
    "/upload".to_string()
}

/// Default timeout for a single generation request in seconds.
const fn default_request_timeout_secs() -> u64 {
    120
}

/// Default document size limit in kilobytes (20MB).
const fn default_max_document_size_kb() -> u64 {
    20 * 1024
}

/// Default port for the session API.
const fn default_port() -> u16 {
    3000
}

/// Default per-subscriber buffer for session events.
const fn default_event_buffer_size() -> usize {
    100
}

/// Main configuration for Cleverly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the generation backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Path of the upload endpoint, appended to `backend_url`.
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Timeout for a single generation request in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Largest document accepted, in kilobytes.
    #[serde(default = "default_max_document_size_kb")]
    pub max_document_size_kb: u64,

    /// Port the session API listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of session events buffered per WebSocket subscriber.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            upload_path: default_upload_path(),
            request_timeout_secs: default_request_timeout_secs(),
            max_document_size_kb: default_max_document_size_kb(),
            port: default_port(),
            event_buffer_size: default_event_buffer_size(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `cleverly.json` in the current directory. If not found,
    /// returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            CleverlyError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `cleverly.json` in a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_file(&config_path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `CleverlyError::ConfigParseError` if the file exists but
    /// contains invalid JSON, and `CleverlyError::ConfigValidationError`
    /// if the values are out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(CleverlyError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CleverlyError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// - `backendUrl` must be an `http://` or `https://` URL
    /// - `uploadPath` must start with `/`
    /// - `requestTimeoutSecs`, `maxDocumentSizeKb` and `eventBufferSize`
    ///   must be greater than 0
    pub fn validate(&self) -> Result<()> {
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CleverlyError::config_validation(
                format!("backendUrl must be an http(s) URL, got '{}'", self.backend_url),
                "Set backendUrl to something like http://localhost:8000 in your cleverly.json",
            ));
        }

        if !self.upload_path.starts_with('/') {
            return Err(CleverlyError::config_validation(
                "uploadPath must start with '/'",
                "Set uploadPath to the backend route, e.g. /upload, in your cleverly.json",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(CleverlyError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 second in your cleverly.json",
            ));
        }

        if self.max_document_size_kb == 0 {
            return Err(CleverlyError::config_validation(
                "maxDocumentSizeKb must be greater than 0",
                "Set maxDocumentSizeKb to at least 1 in your cleverly.json",
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(CleverlyError::config_validation(
                "eventBufferSize must be greater than 0",
                "Set eventBufferSize to at least 1 in your cleverly.json",
            ));
        }

        Ok(())
    }

    /// Full URL of the upload endpoint.
    #[must_use]
    pub fn upload_url(&self) -> String {
        format!(
            "{}{}",
            self.backend_url.trim().trim_end_matches('/'),
            self.upload_path
        )
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Document size limit in bytes.
    #[must_use]
    pub const fn max_document_bytes(&self) -> u64 {
        self.max_document_size_kb.saturating_mul(1024)
    }
}
