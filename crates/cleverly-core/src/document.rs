//! The uploaded document held by a study session.
//!
//! The document is opaque: it is kept as bytes and forwarded to the
//! generation backend as-is. Only its size and name are checked here.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{CleverlyError, Result};

/// Name used when an upload arrives without a file name.
pub const DEFAULT_DOCUMENT_NAME: &str = "document.pdf";

/// A document accepted into the session.
///
/// Content is shared behind an `Arc` so in-flight requests can hold it
/// while the session moves on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    /// Display name, usually the original file name.
    pub name: String,

    /// Raw file bytes.
    #[serde(skip)]
    pub content: Arc<[u8]>,

    /// Size in bytes.
    pub size_bytes: usize,
}

impl UploadedDocument {
    /// Wraps uploaded bytes, enforcing the size limit.
    ///
    /// A blank `name` is replaced with [`DEFAULT_DOCUMENT_NAME`].
    ///
    /// # Errors
    ///
    /// Returns `CleverlyError::DocumentEmpty` if `bytes` is empty.
    /// Returns `CleverlyError::DocumentTooLarge` if it exceeds `max_bytes`.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>, max_bytes: u64) -> Result<Self> {
        let name = name.into();
        let name = if name.trim().is_empty() {
            DEFAULT_DOCUMENT_NAME.to_string()
        } else {
            name
        };

        if bytes.is_empty() {
            return Err(CleverlyError::document_empty(name));
        }

        let size = bytes.len() as u64;
        if size > max_bytes {
            return Err(CleverlyError::document_too_large(
                name,
                size / 1024,
                max_bytes / 1024,
            ));
        }

        Ok(Self {
            name,
            size_bytes: bytes.len(),
            content: Arc::from(bytes),
        })
    }

    /// Reads a document from disk.
    ///
    /// The file size is checked before the content is read.
    ///
    /// # Errors
    ///
    /// Returns `CleverlyError::DocumentNotFound` if the file doesn't exist,
    /// plus the errors of [`UploadedDocument::from_bytes`].
    pub fn load(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CleverlyError::document_not_found(path)
            } else {
                CleverlyError::Io(e)
            }
        })?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_DOCUMENT_NAME)
            .to_string();

        if metadata.len() > max_bytes {
            return Err(CleverlyError::document_too_large(
                name,
                metadata.len() / 1024,
                max_bytes / 1024,
            ));
        }

        let bytes = std::fs::read(path)?;
        Self::from_bytes(name, bytes, max_bytes)
    }
}
