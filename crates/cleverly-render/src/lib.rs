//! Cleverly rendering
//!
//! Turns session state into something a person can read: plain-text views
//! for the terminal carousels, and a [`StudySheet`] export of everything
//! fetched for a document.
//!
//! # Generators
//!
//! - [`text`] - Terminal views of a [`SessionView`](cleverly_core::SessionView)
//! - [`MarkdownGenerator`] - Printable Markdown study sheet
//! - [`json::JsonGenerator`] - JSON study sheet with compact or pretty formatting
//!
//! # Example
//!
//! ```rust
//! use cleverly_core::{ArtifactKind, CanonicalResult, Flashcard, ResultsStore};
//! use cleverly_render::{MarkdownGenerator, StudySheet};
//!
//! let mut results = ResultsStore::default();
//! results.insert(
//!     ArtifactKind::Flashcards,
//!     CanonicalResult::Flashcards(vec![Flashcard::new("What is ATP?", "The cell's energy currency")]),
//! );
//!
//! let sheet = StudySheet::from_results("biology.pdf", &results);
//! let markdown = MarkdownGenerator::new(&sheet).generate();
//! assert!(markdown.contains("# Study Sheet: biology.pdf"));
//! ```

pub mod json;
mod markdown;
pub mod text;

pub use markdown::MarkdownGenerator;

use chrono::{DateTime, Utc};
use cleverly_core::{ArtifactKind, CanonicalResult, Flashcard, QuizItem, ResultsStore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while exporting a study sheet.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to serialize the sheet to JSON.
    #[error("failed to serialize study sheet: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write the output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

// ============================================================================
// StudySheet
// ============================================================================

/// Everything fetched for one document, ready for export.
///
/// Kinds that were never fetched, or that came back as a content error, are
/// left out; their messages are kept in `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySheet {
    /// Name of the source document.
    pub document: String,

    /// When the sheet was assembled.
    pub generated_at: DateTime<Utc>,

    /// Summary text, if fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Flashcards, if fetched.
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,

    /// Quiz questions, if fetched.
    #[serde(default)]
    pub quiz: Vec<QuizItem>,

    /// Backend content errors by kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SheetError>,
}

/// A content error reported for one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetError {
    /// The kind that failed.
    pub kind: ArtifactKind,
    /// The backend's message.
    pub message: String,
}

impl StudySheet {
    /// Assembles a sheet from a results store, stamped with the current time.
    #[must_use]
    pub fn from_results(document: impl Into<String>, results: &ResultsStore) -> Self {
        Self::from_results_at(document, results, Utc::now())
    }

    /// Assembles a sheet with an explicit timestamp.
    #[must_use]
    pub fn from_results_at(
        document: impl Into<String>,
        results: &ResultsStore,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut sheet = Self {
            document: document.into(),
            generated_at,
            ..Self::default()
        };

        for kind in ArtifactKind::ALL {
            match results.get(kind) {
                Some(CanonicalResult::Flashcards(cards)) => sheet.flashcards.clone_from(cards),
                Some(CanonicalResult::Quiz(items)) => sheet.quiz.clone_from(items),
                Some(CanonicalResult::Summary(text)) => sheet.summary = Some(text.clone()),
                Some(CanonicalResult::ContentError(message)) => sheet.errors.push(SheetError {
                    kind,
                    message: message.clone(),
                }),
                None => {}
            }
        }

        sheet
    }

    /// Returns `true` if the sheet has no content at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summary.as_deref().map_or(true, str::is_empty)
            && self.flashcards.is_empty()
            && self.quiz.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
