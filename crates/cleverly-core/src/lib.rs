//! Cleverly core
//!
//! Normalizes generation backend payloads into study artifacts, drives the
//! flashcard and quiz carousels, and runs the upload, choose and results
//! session workflow behind an HTTP and WebSocket API.

pub mod api;
pub mod artifact;
pub mod carousel;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod normalize;
pub mod resolver;
pub mod workflow;

pub use api::{create_router, AnswerRequest, AppState, ErrorResponse, NavigateRequest, SelectRequest};
pub use artifact::{ArtifactKind, CanonicalResult, Flashcard, QuizItem, ResultsStore};
pub use carousel::{
    Carousel, Direction, FlashcardCarousel, FlashcardView, OptionMark, QuizCarousel, QuizFeedback,
    QuizView,
};
pub use client::{Generator, HttpGenerator};
pub use config::Config;
pub use document::{UploadedDocument, DEFAULT_DOCUMENT_NAME};
pub use error::{CleverlyError, Result, UpstreamErrorKind};
pub use events::{EventBroadcaster, NoticePayload, SessionEvent};
pub use normalize::{
    normalize_flashcards, normalize_payload, normalize_quiz, normalize_summary, FlashcardShape,
    QuizShape, RawPayload, SummaryShape, PARAGRAPH_SEPARATOR,
};
pub use resolver::{letter_index, resolve_all, resolve_answer};
pub use workflow::{
    Completion, Notice, PendingRequest, RequestTicket, Selection, Session, SessionView, Stage,
};
