//! Canonical study artifacts and the per-kind results store.
//!
//! Whatever shape the generation backend returns, downstream code only ever
//! sees the types in this module.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CleverlyError;

// ============================================================================
// ArtifactKind
// ============================================================================

/// The kind of study material requested from the backend.
///
/// Serialized lowercase; the same value is sent as the upload's `type`
/// form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Question/answer cards.
    Flashcards,
    /// Multiple-choice questions.
    Quiz,
    /// Multi-paragraph summary text.
    Summary,
}

impl ArtifactKind {
    /// All kinds, in the order they are offered to the user.
    pub const ALL: [Self; 3] = [Self::Flashcards, Self::Quiz, Self::Summary];

    /// Wire name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flashcards => "flashcards",
            Self::Quiz => "quiz",
            Self::Summary => "summary",
        }
    }

    /// Heading shown above the results.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Flashcards => "Flashcards",
            Self::Quiz => "Quiz",
            Self::Summary => "Summary",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = CleverlyError;

    /// Parses a kind case-insensitively.
    ///
    /// ```
    /// use cleverly_core::ArtifactKind;
    ///
    /// assert_eq!("Quiz".parse::<ArtifactKind>().unwrap(), ArtifactKind::Quiz);
    /// assert!("essay".parse::<ArtifactKind>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flashcards" => Ok(Self::Flashcards),
            "quiz" => Ok(Self::Quiz),
            "summary" => Ok(Self::Summary),
            _ => Err(CleverlyError::UnknownArtifactKind(s.to_string())),
        }
    }
}

// ============================================================================
// Flashcard and QuizItem
// ============================================================================

/// A single question/answer card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Front of the card.
    pub question: String,
    /// Back of the card.
    pub answer: String,
}

impl Flashcard {
    /// Creates a new card.
    #[must_use]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A multiple-choice question.
///
/// After normalization `answer` holds the literal text of the correct
/// option whenever the backend's answer could be resolved against
/// `options`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    /// The question text.
    pub question: String,
    /// Answer choices in display order.
    pub options: Vec<String>,
    /// The correct answer.
    pub answer: String,
}

impl QuizItem {
    /// Creates a new quiz item.
    #[must_use]
    pub fn new<I, S>(question: impl Into<String>, options: I, answer: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            question: question.into(),
            options: options.into_iter().map(Into::into).collect(),
            answer: answer.into(),
        }
    }
}

// ============================================================================
// CanonicalResult
// ============================================================================

/// The normalized result of one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CanonicalResult {
    /// Flashcards, flattened across topics.
    Flashcards(Vec<Flashcard>),
    /// Quiz items, flattened across topics and answer-resolved.
    Quiz(Vec<QuizItem>),
    /// Summary paragraphs joined by blank lines.
    Summary(String),
    /// The backend reported that it could not produce content.
    ContentError(String),
}

impl CanonicalResult {
    /// Number of navigable entries (cards or questions); 0 for text results.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Flashcards(cards) => cards.len(),
            Self::Quiz(items) => items.len(),
            Self::Summary(_) | Self::ContentError(_) => 0,
        }
    }

    /// Returns `true` if there is nothing to display.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Summary(text) => text.is_empty(),
            Self::ContentError(_) => false,
            Self::Flashcards(_) | Self::Quiz(_) => self.len() == 0,
        }
    }

    /// Returns the flashcards, if this is a flashcard result.
    #[must_use]
    pub fn as_flashcards(&self) -> Option<&[Flashcard]> {
        match self {
            Self::Flashcards(cards) => Some(cards),
            _ => None,
        }
    }

    /// Returns the quiz items, if this is a quiz result.
    #[must_use]
    pub fn as_quiz(&self) -> Option<&[QuizItem]> {
        match self {
            Self::Quiz(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the summary text, if this is a summary result.
    #[must_use]
    pub fn as_summary(&self) -> Option<&str> {
        match self {
            Self::Summary(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the backend's error message, if generation failed in-band.
    #[must_use]
    pub fn content_error(&self) -> Option<&str> {
        match self {
            Self::ContentError(message) => Some(message),
            _ => None,
        }
    }
}

// ============================================================================
// ResultsStore
// ============================================================================

/// Fetched results keyed by artifact kind.
///
/// Entries are independent: storing one kind never touches the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsStore {
    /// Flashcard result, if fetched.
    pub flashcards: Option<CanonicalResult>,
    /// Quiz result, if fetched.
    pub quiz: Option<CanonicalResult>,
    /// Summary result, if fetched.
    pub summary: Option<CanonicalResult>,
}

impl ResultsStore {
    /// Returns the stored result for `kind`.
    #[must_use]
    pub const fn get(&self, kind: ArtifactKind) -> Option<&CanonicalResult> {
        match kind {
            ArtifactKind::Flashcards => self.flashcards.as_ref(),
            ArtifactKind::Quiz => self.quiz.as_ref(),
            ArtifactKind::Summary => self.summary.as_ref(),
        }
    }

    /// Returns `true` if a result for `kind` has been stored.
    #[must_use]
    pub const fn contains(&self, kind: ArtifactKind) -> bool {
        self.get(kind).is_some()
    }

    /// Stores the result for `kind`, replacing any previous one.
    pub fn insert(&mut self, kind: ArtifactKind, result: CanonicalResult) {
        let slot = match kind {
            ArtifactKind::Flashcards => &mut self.flashcards,
            ArtifactKind::Quiz => &mut self.quiz,
            ArtifactKind::Summary => &mut self.summary,
        };
        *slot = Some(result);
    }

    /// Resets every entry to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` if no kind has been fetched.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.flashcards.is_none() && self.quiz.is_none() && self.summary.is_none()
    }
}
