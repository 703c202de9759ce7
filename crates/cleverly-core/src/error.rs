//! Error types for the Cleverly core.
//!
//! This module defines the error hierarchy for configuration loading,
//! document intake, upstream generation requests and workflow transitions.
//! Malformed generation payloads are deliberately absent: the normalizer
//! degrades them to empty canonical values instead of failing.

use std::path::PathBuf;

/// A specialized `Result` type for Cleverly operations.
pub type Result<T> = std::result::Result<T, CleverlyError>;

/// Errors that can occur while running a study session.
///
/// Error variants are organized by subsystem and include actionable suggestions
/// where possible to help users resolve issues.
#[derive(Debug, thiserror::Error)]
pub enum CleverlyError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your cleverly.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Document Errors
    // ========================================================================
    /// Document file was not found at the specified path.
    #[error("Document not found: '{path}'\n\nSuggestion: Check the path to the PDF you want to study")]
    DocumentNotFound {
        /// Path where the document was expected.
        path: PathBuf,
    },

    /// Document exceeds the configured size limit.
    #[error("Document '{name}' is {size_kb}KB, above the {limit_kb}KB limit\n\nSuggestion: Split the document or raise maxDocumentSizeKb in cleverly.json")]
    DocumentTooLarge {
        /// Display name of the oversized document.
        name: String,
        /// Actual size in kilobytes.
        size_kb: u64,
        /// Configured limit in kilobytes.
        limit_kb: u64,
    },

    /// Document has no content.
    #[error("Document '{name}' is empty\n\nSuggestion: Choose a file that contains text")]
    DocumentEmpty {
        /// Display name of the empty document.
        name: String,
    },

    // ========================================================================
    // Upstream Errors
    // ========================================================================
    /// The generation backend could not be reached or rejected the request.
    #[error("Generation request failed ({kind}): {message}\n\nSuggestion: {suggestion}")]
    Upstream {
        /// The kind of upstream failure.
        kind: UpstreamErrorKind,
        /// Detailed error message, including the backend's own text when available.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Workflow Errors
    // ========================================================================
    /// An artifact was requested while no document is loaded.
    #[error("No document loaded\n\nSuggestion: Upload a document before choosing flashcards, a quiz or a summary")]
    NoDocument,

    /// An unknown artifact kind was named.
    #[error("Unknown artifact kind '{0}': expected one of 'flashcards', 'quiz', 'summary'")]
    UnknownArtifactKind(String),

    /// An unknown carousel direction was named.
    #[error("Unknown direction '{0}': expected 'prev' or 'next'")]
    UnknownDirection(String),

    /// Invalid state transition attempted.
    #[error("Invalid state transition: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The current stage.
        from: String,
        /// The attempted target.
        to: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Categories of upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// The backend could not be reached.
    Network,
    /// The backend did not answer within the configured timeout.
    Timeout,
    /// The backend answered with a non-success status.
    Server,
    /// The backend answered with a body that is not JSON.
    Decode,
}

impl std::fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Timeout => write!(f, "timeout"),
            Self::Server => write!(f, "server"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

impl UpstreamErrorKind {
    /// Returns a suggestion message for this error kind.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Network => "Check that the generation backend is running and backendUrl is correct",
            Self::Timeout => "Try a smaller document or raise requestTimeoutSecs",
            Self::Server => "Try again or use a different PDF",
            Self::Decode => "Check that backendUrl points at the generation service",
        }
    }
}

impl CleverlyError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `DocumentNotFound` error.
    #[must_use]
    pub fn document_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DocumentNotFound { path: path.into() }
    }

    /// Creates a new `DocumentTooLarge` error.
    #[must_use]
    pub fn document_too_large(name: impl Into<String>, size_kb: u64, limit_kb: u64) -> Self {
        Self::DocumentTooLarge {
            name: name.into(),
            size_kb,
            limit_kb,
        }
    }

    /// Creates a new `DocumentEmpty` error.
    #[must_use]
    pub fn document_empty(name: impl Into<String>) -> Self {
        Self::DocumentEmpty { name: name.into() }
    }

    /// Creates a new `Upstream` error with automatic suggestion based on error kind.
    #[must_use]
    pub fn upstream(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        let suggestion = kind.suggestion().to_string();
        Self::Upstream {
            kind,
            message: message.into(),
            suggestion,
        }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns the short, user-facing text for a failure notice.
    ///
    /// Upstream errors yield only the underlying message; the suggestion
    /// block is meant for terminal output, not for inline notifications.
    #[must_use]
    pub fn notice_text(&self) -> String {
        match self {
            Self::Upstream { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Returns `true` if this error violates a workflow precondition.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NoDocument | Self::InvalidStateTransition { .. }
        )
    }
}
