//! Upstream generation client.
//!
//! The [`Generator`] trait is the seam between the workflow and whatever
//! produces study material. [`HttpGenerator`] talks to the generation
//! backend over HTTP; tests substitute their own implementations.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::artifact::ArtifactKind;
use crate::config::Config;
use crate::document::UploadedDocument;
use crate::error::{CleverlyError, Result, UpstreamErrorKind};
use crate::normalize::RawPayload;

/// Produces a raw payload for a document and artifact kind.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Requests `kind` for `document`.
    ///
    /// # Errors
    ///
    /// Returns `CleverlyError::Upstream` when the request fails.
    async fn generate(&self, document: &UploadedDocument, kind: ArtifactKind) -> Result<RawPayload>;
}

/// [`Generator`] backed by the HTTP upload endpoint.
///
/// Sends `multipart/form-data` with a `file` part holding the document and
/// a `type` part naming the artifact kind.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    upload_url: String,
}

impl HttpGenerator {
    /// Builds a client from the backend settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns `CleverlyError::Upstream` if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                CleverlyError::upstream(
                    UpstreamErrorKind::Network,
                    format!("failed to build HTTP client: {e}"),
                )
            })?;
        Ok(Self::with_client(client, config.upload_url()))
    }

    /// Uses an existing client against `upload_url`.
    #[must_use]
    pub fn with_client(client: reqwest::Client, upload_url: impl Into<String>) -> Self {
        Self {
            client,
            upload_url: upload_url.into(),
        }
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, document: &UploadedDocument, kind: ArtifactKind) -> Result<RawPayload> {
        let part = Part::bytes(document.content.to_vec()).file_name(document.name.clone());
        let form = Form::new()
            .part("file", part)
            .text("type", kind.as_str());

        tracing::debug!(
            url = %self.upload_url,
            kind = %kind,
            document = %document.name,
            bytes = document.size_bytes,
            "Sending generation request"
        );

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, kind = %kind, "Generation backend returned an error");
            let message = if body.trim().is_empty() {
                format!("Server error: {status}")
            } else {
                format!("Server error: {status}: {}", body.trim())
            };
            return Err(CleverlyError::upstream(UpstreamErrorKind::Server, message));
        }

        let body = response.bytes().await.map_err(from_reqwest)?;
        let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            CleverlyError::upstream(
                UpstreamErrorKind::Decode,
                format!("response is not valid JSON: {e}"),
            )
        })?;

        tracing::debug!(status = %status, kind = %kind, "Generation response received");
        Ok(RawPayload::new(value))
    }
}

/// Maps a transport error to the matching upstream error kind.
fn from_reqwest(err: reqwest::Error) -> CleverlyError {
    let kind = if err.is_timeout() {
        UpstreamErrorKind::Timeout
    } else if err.is_decode() {
        UpstreamErrorKind::Decode
    } else {
        UpstreamErrorKind::Network
    };
    CleverlyError::upstream(kind, err.to_string())
}
