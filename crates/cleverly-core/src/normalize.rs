//! Normalization of raw generation payloads into canonical artifacts.
//!
//! The backend has changed its output conventions over time: flashcards
//! arrived first as `[question, answer]` pairs and later as objects, quiz
//! lists have lived under both `quiz` and `quizQuestions`, and summaries
//! come as a single string or a list of fragments. Each convention is
//! classified into a shape enum at the boundary, and every normalizer
//! degrades malformed input to an empty value instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::{ArtifactKind, CanonicalResult, Flashcard, QuizItem};
use crate::resolver::resolve_answer;

/// Separator placed between summary fragments.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

// ============================================================================
// RawPayload
// ============================================================================

/// An untyped response body from the generation backend.
///
/// The expected layout is `{"topics": [{...}, ...]}` where each topic may
/// carry `flashcards`, `quiz`/`quizQuestions`, `summary` and `error`
/// fields. Any part of it may be missing or of the wrong type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload(pub Value);

impl RawPayload {
    /// Wraps a JSON value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the per-topic entries.
    ///
    /// A payload without a `topics` array but with artifact fields at the
    /// top level is treated as a single topic.
    #[must_use]
    pub fn topics(&self) -> Vec<&Value> {
        match self.0.get("topics") {
            Some(Value::Array(topics)) => topics.iter().collect(),
            _ if has_artifact_fields(&self.0) => vec![&self.0],
            _ => Vec::new(),
        }
    }

    /// Returns the top-level `error` message, if the backend reported one.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        error_text(&self.0)
    }

    /// Returns the top-level `overall_summary`, if present.
    #[must_use]
    pub fn overall_summary(&self) -> Option<&Value> {
        self.0.get("overall_summary").filter(|v| !v.is_null())
    }
}

impl From<Value> for RawPayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Returns `true` if `value` is an object holding any artifact field.
fn has_artifact_fields(value: &Value) -> bool {
    ["flashcards", "quiz", "quizQuestions", "summary"]
        .iter()
        .any(|key| value.get(key).is_some_and(|v| !v.is_null()))
}

/// Returns a non-empty string `error` field of `value`.
fn error_text(value: &Value) -> Option<&str> {
    value
        .get("error")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// ============================================================================
// Shapes
// ============================================================================

/// The recognized layouts of a raw summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SummaryShape<'a> {
    /// A list of paragraph fragments.
    Fragments(&'a [Value]),
    /// A single block of text.
    Text(&'a str),
    /// Missing, null or of an unexpected type.
    Absent,
}

impl<'a> SummaryShape<'a> {
    /// Classifies a raw summary value.
    #[must_use]
    pub fn classify(raw: Option<&'a Value>) -> Self {
        match raw {
            Some(Value::Array(fragments)) => Self::Fragments(fragments),
            Some(Value::String(text)) => Self::Text(text),
            _ => Self::Absent,
        }
    }
}

/// The recognized layouts of a raw flashcard list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlashcardShape<'a> {
    /// Positional `[question, answer]` pairs.
    Pairs(&'a [Value]),
    /// `{question, answer}` objects.
    Objects(&'a [Value]),
    /// Missing, null or not a list.
    Absent,
}

impl<'a> FlashcardShape<'a> {
    /// Classifies a raw flashcard list by looking at its first element.
    #[must_use]
    pub fn classify(raw: Option<&'a Value>) -> Self {
        match raw {
            Some(Value::Array(items)) if matches!(items.first(), Some(Value::Array(_))) => {
                Self::Pairs(items)
            }
            Some(Value::Array(items)) => Self::Objects(items),
            _ => Self::Absent,
        }
    }
}

/// The recognized locations of a raw quiz list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuizShape<'a> {
    /// Items under the `quiz` key.
    Quiz(&'a [Value]),
    /// Items under the older `quizQuestions` key.
    QuizQuestions(&'a [Value]),
    /// Neither key holds a list.
    Absent,
}

impl<'a> QuizShape<'a> {
    /// Classifies the quiz list held by a topic-like object.
    ///
    /// `quiz` wins whenever it is present and not null, even if it turns
    /// out not to be a list.
    #[must_use]
    pub fn classify(container: &'a Value) -> Self {
        let quiz = container.get("quiz").filter(|v| !v.is_null());
        match quiz {
            Some(Value::Array(items)) => Self::Quiz(items),
            Some(_) => Self::Absent,
            None => match container.get("quizQuestions") {
                Some(Value::Array(items)) => Self::QuizQuestions(items),
                _ => Self::Absent,
            },
        }
    }
}

// ============================================================================
// Normalizers
// ============================================================================

/// Normalizes a raw summary into a single string.
///
/// ```
/// use cleverly_core::normalize_summary;
/// use serde_json::json;
///
/// assert_eq!(normalize_summary(Some(&json!(["A", "B"]))), "A\n\nB");
/// assert_eq!(normalize_summary(Some(&json!("Plain"))), "Plain");
/// assert_eq!(normalize_summary(None), "");
/// ```
#[must_use]
pub fn normalize_summary(raw: Option<&Value>) -> String {
    match SummaryShape::classify(raw) {
        SummaryShape::Fragments(fragments) => fragments
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR),
        SummaryShape::Text(text) => text.to_string(),
        SummaryShape::Absent => String::new(),
    }
}

/// Normalizes a raw flashcard list.
///
/// Pair lists are read positionally with missing or non-string entries
/// becoming `""`. Object lists keep their order; non-object entries are
/// dropped.
#[must_use]
pub fn normalize_flashcards(raw: Option<&Value>) -> Vec<Flashcard> {
    match FlashcardShape::classify(raw) {
        FlashcardShape::Pairs(items) => items
            .iter()
            .map(|pair| Flashcard {
                question: string_at(pair.get(0)),
                answer: string_at(pair.get(1)),
            })
            .collect(),
        FlashcardShape::Objects(items) => items
            .iter()
            .filter(|item| item.is_object())
            .map(|item| Flashcard {
                question: string_at(item.get("question")),
                answer: string_at(item.get("answer")),
            })
            .collect(),
        FlashcardShape::Absent => Vec::new(),
    }
}

/// Normalizes the quiz list held by a topic-like object.
///
/// Each item goes through [`resolve_answer`], so a letter answer is
/// replaced by the option text it names.
#[must_use]
pub fn normalize_quiz(container: &Value) -> Vec<QuizItem> {
    let items = match QuizShape::classify(container) {
        QuizShape::Quiz(items) | QuizShape::QuizQuestions(items) => items,
        QuizShape::Absent => return Vec::new(),
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| {
            resolve_answer(QuizItem {
                question: string_at(item.get("question")),
                options: options_at(item.get("options")),
                answer: string_at(item.get("answer")),
            })
        })
        .collect()
}

/// Reads a string field, defaulting to `""`.
fn string_at(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Reads an option list; numbers and booleans are stringified, other
/// entries are skipped.
fn options_at(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(options)) = value else {
        return Vec::new();
    };

    options
        .iter()
        .filter_map(|opt| match opt {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Payload aggregation
// ============================================================================

/// Normalizes a whole payload for the requested kind.
///
/// Flashcards and quiz items are concatenated across topics in topic
/// order. Summary fragments are joined one paragraph per topic, skipping
/// topics without one. A topic carrying an `error` only holds placeholder
/// content and contributes nothing. A backend-reported error becomes
/// [`CanonicalResult::ContentError`] when it is reported at the top level,
/// or when every topic failed.
#[must_use]
pub fn normalize_payload(payload: &RawPayload, kind: ArtifactKind) -> CanonicalResult {
    if let Some(message) = payload.error() {
        return CanonicalResult::ContentError(message.to_string());
    }

    let topics = payload.topics();
    if let Some(message) = all_topics_failed(&topics) {
        return CanonicalResult::ContentError(message.to_string());
    }

    let healthy: Vec<&Value> = topics
        .into_iter()
        .filter(|topic| error_text(topic).is_none())
        .collect();

    match kind {
        ArtifactKind::Flashcards => CanonicalResult::Flashcards(
            healthy
                .iter()
                .flat_map(|topic| normalize_flashcards(topic.get("flashcards")))
                .collect(),
        ),
        ArtifactKind::Quiz => CanonicalResult::Quiz(
            healthy.iter().flat_map(|topic| normalize_quiz(topic)).collect(),
        ),
        ArtifactKind::Summary => CanonicalResult::Summary(aggregate_summary(payload, &healthy)),
    }
}

/// Joins per-topic summary fragments, falling back to `overall_summary`.
fn aggregate_summary(payload: &RawPayload, topics: &[&Value]) -> String {
    let paragraphs: Vec<String> = topics
        .iter()
        .map(|topic| normalize_summary(topic.get("summary")))
        .filter(|text| !text.is_empty())
        .collect();

    if paragraphs.is_empty() {
        return normalize_summary(payload.overall_summary());
    }

    paragraphs.join(PARAGRAPH_SEPARATOR)
}

/// Returns the first topic error if there are topics and all of them failed.
fn all_topics_failed<'a>(topics: &[&'a Value]) -> Option<&'a str> {
    let mut errors = topics.iter().map(|topic| error_text(*topic));
    let first = errors.next()??;
    errors.all(|e| e.is_some()).then_some(first)
}
