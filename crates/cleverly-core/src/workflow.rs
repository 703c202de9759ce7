//! Study session state machine.
//!
//! A [`Session`] moves through three stages:
//! - `Upload` -> `Choose` when a document is accepted
//! - `Choose` -> `Results` when an artifact kind is selected
//! - `Results` -> `Choose` on going back or on a failed request
//! - `Choose`/`Results` -> `Upload` when the document is removed
//!
//! Requests are issued as [`PendingRequest`]s carrying a [`RequestTicket`].
//! Any transition that abandons a request bumps the session generation, so a
//! late completion with an old ticket is dropped instead of being stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactKind, CanonicalResult, ResultsStore};
use crate::carousel::{Direction, FlashcardCarousel, FlashcardView, QuizCarousel, QuizView};
use crate::client::Generator;
use crate::document::UploadedDocument;
use crate::error::{CleverlyError, Result};
use crate::normalize::{normalize_payload, RawPayload};

// ============================================================================
// Stage
// ============================================================================

/// Top-level stage of a study session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Waiting for a document.
    #[default]
    Upload,
    /// Document loaded, waiting for an artifact kind.
    Choose,
    /// Showing (or loading) the selected artifact.
    Results,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upload => write!(f, "upload"),
            Self::Choose => write!(f, "choose"),
            Self::Results => write!(f, "results"),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Identifies one outstanding generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTicket {
    /// Session generation at the time the request was issued.
    pub generation: u64,
    /// The requested kind.
    pub kind: ArtifactKind,
}

/// A request the caller must run and report back via
/// [`Session::complete_request`].
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// Ticket to hand back on completion.
    pub ticket: RequestTicket,
    /// The document to send.
    pub document: UploadedDocument,
}

impl PendingRequest {
    /// Runs the request against `generator`.
    ///
    /// Errors are returned alongside the ticket rather than propagated, since
    /// the session decides what a failure means.
    pub async fn run(self, generator: &dyn Generator) -> (RequestTicket, Result<RawPayload>) {
        let outcome = generator.generate(&self.document, self.ticket.kind).await;
        (self.ticket, outcome)
    }
}

/// What [`Session::select_artifact`] did.
#[derive(Debug, Clone)]
pub enum Selection {
    /// A request was issued and must be run.
    Requested(PendingRequest),
    /// The kind was already fetched; results are shown without a request.
    Cached,
    /// A request is already in flight; the selection was dropped.
    Ignored,
}

/// What [`Session::complete_request`] did with a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The normalized result was stored.
    Stored(ArtifactKind),
    /// The request failed and the session went back to `Choose`.
    Failed(Notice),
    /// The ticket was outdated; nothing changed.
    Stale,
}

// ============================================================================
// Notice
// ============================================================================

/// A failure message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Human-readable error text.
    pub message: String,
    /// When the failure happened.
    pub at: DateTime<Utc>,
}

impl Notice {
    /// Creates a notice stamped with the current time.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            at: Utc::now(),
        }
    }
}

// ============================================================================
// SessionView
// ============================================================================

/// Read-only snapshot of a session for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Current stage.
    pub stage: Stage,
    /// Name of the loaded document.
    pub document: Option<String>,
    /// The kind being shown in `Results`.
    pub selected: Option<ArtifactKind>,
    /// Whether a request is in flight.
    pub loading: bool,
    /// The last failure, if any.
    pub notice: Option<Notice>,
    /// Everything fetched for the current document.
    pub results: ResultsStore,
    /// Flashcard carousel, when flashcards are selected and non-empty.
    pub flashcards: Option<FlashcardView>,
    /// Quiz carousel, when the quiz is selected and non-empty.
    pub quiz: Option<QuizView>,
}

// ============================================================================
// Session
// ============================================================================

/// State of one user's study session.
///
/// All mutation goes through the transition methods; presentation reads
/// [`Session::view`].
#[derive(Debug, Clone, Default)]
pub struct Session {
    stage: Stage,
    document: Option<UploadedDocument>,
    selected: Option<ArtifactKind>,
    loading: bool,
    generation: u64,
    results: ResultsStore,
    flashcards: FlashcardCarousel,
    quiz: QuizCarousel,
    notice: Option<Notice>,
}

impl Session {
    /// Creates an empty session in the `Upload` stage.
    ///
    /// # Examples
    ///
    /// ```
    /// use cleverly_core::{Session, Stage};
    ///
    /// let session = Session::new();
    /// assert_eq!(session.stage(), Stage::Upload);
    /// assert!(!session.is_loading());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// The loaded document.
    #[must_use]
    pub const fn document(&self) -> Option<&UploadedDocument> {
        self.document.as_ref()
    }

    /// The kind being shown in `Results`.
    #[must_use]
    pub const fn selected(&self) -> Option<ArtifactKind> {
        self.selected
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Current request generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Everything fetched for the current document.
    #[must_use]
    pub const fn results(&self) -> &ResultsStore {
        &self.results
    }

    /// The last failure, if any.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Accepts a document, replacing any previous one.
    ///
    /// Allowed from every stage. Clears the results store and abandons any
    /// in-flight request.
    pub fn accept_document(&mut self, document: UploadedDocument) {
        tracing::info!(
            document = %document.name,
            bytes = document.size_bytes,
            from = %self.stage,
            "Document accepted"
        );
        self.abandon_request();
        self.document = Some(document);
        self.results.clear();
        self.selected = None;
        self.notice = None;
        self.stage = Stage::Choose;
        self.reset_carousels();
    }

    /// Selects an artifact kind and moves to `Results`.
    ///
    /// The stage changes immediately. If the kind has not been fetched yet a
    /// [`PendingRequest`] is returned for the caller to run.
    ///
    /// # Errors
    ///
    /// Returns `CleverlyError::NoDocument` if no document is loaded, and
    /// `CleverlyError::InvalidStateTransition` outside the `Choose` stage.
    pub fn select_artifact(&mut self, kind: ArtifactKind) -> Result<Selection> {
        let Some(document) = self.document.clone() else {
            return Err(CleverlyError::NoDocument);
        };

        if self.loading {
            tracing::debug!(kind = %kind, generation = self.generation, "Request in flight, ignoring selection");
            return Ok(Selection::Ignored);
        }

        if self.stage != Stage::Choose {
            return Err(CleverlyError::invalid_transition(self.stage, Stage::Results));
        }

        self.selected = Some(kind);
        self.stage = Stage::Results;
        self.notice = None;
        self.reset_carousels();

        if self.results.contains(kind) {
            tracing::debug!(kind = %kind, "Showing cached result");
            return Ok(Selection::Cached);
        }

        self.generation += 1;
        self.loading = true;
        let ticket = RequestTicket {
            generation: self.generation,
            kind,
        };
        tracing::info!(kind = %kind, generation = ticket.generation, "Requesting artifact");

        Ok(Selection::Requested(PendingRequest { ticket, document }))
    }

    /// Applies the outcome of a request.
    ///
    /// On success the payload is normalized for the ticket's kind and stored.
    /// On failure the session returns to `Choose` with a notice. Completions
    /// for abandoned requests are dropped.
    pub fn complete_request(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<RawPayload>,
    ) -> Completion {
        if !self.loading
            || ticket.generation != self.generation
            || self.selected != Some(ticket.kind)
        {
            tracing::debug!(
                kind = %ticket.kind,
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale completion"
            );
            return Completion::Stale;
        }

        self.loading = false;

        match outcome {
            Ok(payload) => {
                let result = normalize_payload(&payload, ticket.kind);
                if let CanonicalResult::ContentError(message) = &result {
                    tracing::warn!(kind = %ticket.kind, error = %message, "Backend reported a content error");
                } else {
                    tracing::info!(kind = %ticket.kind, items = result.len(), "Artifact stored");
                }
                self.results.insert(ticket.kind, result);
                self.reset_carousels();
                Completion::Stored(ticket.kind)
            }
            Err(err) => {
                tracing::warn!(kind = %ticket.kind, error = %err, "Generation request failed");
                let notice = Notice::new(err.notice_text());
                self.notice = Some(notice.clone());
                self.selected = None;
                self.stage = Stage::Choose;
                self.reset_carousels();
                Completion::Failed(notice)
            }
        }
    }

    /// Returns from `Results` to `Choose`, keeping fetched results.
    ///
    /// # Errors
    ///
    /// Returns `CleverlyError::InvalidStateTransition` outside `Results`.
    pub fn go_back(&mut self) -> Result<()> {
        if self.stage != Stage::Results {
            return Err(CleverlyError::invalid_transition(self.stage, Stage::Choose));
        }
        self.abandon_request();
        self.selected = None;
        self.stage = Stage::Choose;
        self.reset_carousels();
        tracing::debug!(stage = %self.stage, "Went back");
        Ok(())
    }

    /// Drops the document and everything fetched for it.
    ///
    /// # Errors
    ///
    /// Returns `CleverlyError::NoDocument` in the `Upload` stage.
    pub fn remove_document(&mut self) -> Result<()> {
        if self.stage == Stage::Upload {
            return Err(CleverlyError::NoDocument);
        }
        self.abandon_request();
        self.document = None;
        self.selected = None;
        self.results.clear();
        self.notice = None;
        self.stage = Stage::Upload;
        self.reset_carousels();
        tracing::info!("Document removed");
        Ok(())
    }

    /// Moves the carousel of the selected kind.
    ///
    /// Returns `true` if the position changed. A summary has no carousel, so
    /// navigating it is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CleverlyError::InvalidStateTransition` outside `Results`.
    pub fn navigate(&mut self, direction: Direction) -> Result<bool> {
        if self.stage != Stage::Results {
            return Err(CleverlyError::invalid_transition(self.stage, "navigate"));
        }
        let moved = match self.selected {
            Some(ArtifactKind::Flashcards) => self.flashcards.step(direction),
            Some(ArtifactKind::Quiz) => self.quiz.step(direction),
            Some(ArtifactKind::Summary) | None => false,
        };
        Ok(moved)
    }

    /// Answers the current quiz question.
    ///
    /// Returns `true` if the pick was taken. Picks are ignored once the
    /// question is revealed, or when `option` is not one of its options.
    ///
    /// # Errors
    ///
    /// Returns `CleverlyError::InvalidStateTransition` unless a quiz is shown.
    pub fn select_quiz_option(&mut self, option: &str) -> Result<bool> {
        if self.stage != Stage::Results || self.selected != Some(ArtifactKind::Quiz) {
            return Err(CleverlyError::invalid_transition(self.stage, "answer"));
        }

        let items = self
            .results
            .get(ArtifactKind::Quiz)
            .and_then(CanonicalResult::as_quiz)
            .unwrap_or_default();
        let Some(item) = items.get(self.quiz.index()) else {
            return Ok(false);
        };
        if !item.options.iter().any(|opt| opt == option) {
            tracing::debug!(option, "Ignoring pick that is not an option");
            return Ok(false);
        }

        Ok(self.quiz.select_option(option))
    }

    /// Builds a read-only snapshot.
    #[must_use]
    pub fn view(&self) -> SessionView {
        let flashcards = match self.selected {
            Some(ArtifactKind::Flashcards) => self
                .results
                .get(ArtifactKind::Flashcards)
                .and_then(CanonicalResult::as_flashcards)
                .and_then(|cards| self.flashcards.view(cards)),
            _ => None,
        };
        let quiz = match self.selected {
            Some(ArtifactKind::Quiz) => self
                .results
                .get(ArtifactKind::Quiz)
                .and_then(CanonicalResult::as_quiz)
                .and_then(|items| self.quiz.view(items)),
            _ => None,
        };

        SessionView {
            stage: self.stage,
            document: self.document.as_ref().map(|doc| doc.name.clone()),
            selected: self.selected,
            loading: self.loading,
            notice: self.notice.clone(),
            results: self.results.clone(),
            flashcards,
            quiz,
        }
    }

    fn abandon_request(&mut self) {
        if self.loading {
            tracing::debug!(generation = self.generation, "Abandoning in-flight request");
        }
        self.generation += 1;
        self.loading = false;
    }

    fn reset_carousels(&mut self) {
        let cards = self.results.get(ArtifactKind::Flashcards).map_or(0, CanonicalResult::len);
        let questions = self.results.get(ArtifactKind::Quiz).map_or(0, CanonicalResult::len);
        self.flashcards = FlashcardCarousel::over(cards);
        self.quiz = QuizCarousel::over(questions);
    }
}

// ============================================================================
// Tests
// ============================================================================
