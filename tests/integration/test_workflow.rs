//! End-to-end tests for the study workflow against an HTTP backend.
//!
//! Each test starts a fake generation backend, points an
//! [`HttpGenerator`] at it and drives a [`Session`] through
//! upload → choose → results.

mod fake_backend;

use std::time::Duration;

use cleverly_core::{
    ArtifactKind, CanonicalResult, CleverlyError, Completion, Config, Direction, Generator,
    HttpGenerator, QuizFeedback, Selection, Session, Stage, UploadedDocument, UpstreamErrorKind,
};
use cleverly_render::{json::JsonGenerator, text, MarkdownGenerator, StudySheet};
use fake_backend::{FakeBackend, Reply};
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn config_for(backend: &FakeBackend) -> Config {
    Config {
        backend_url: backend.url.clone(),
        request_timeout_secs: 5,
        ..Config::default()
    }
}

fn document(name: &str) -> UploadedDocument {
    UploadedDocument::from_bytes(name, b"%PDF-1.4 lecture notes".to_vec(), 1024 * 1024)
        .expect("Failed to build document")
}

/// Selects `kind`, runs the request against `generator` and applies it.
async fn select_and_wait(
    session: &mut Session,
    generator: &dyn Generator,
    kind: ArtifactKind,
) -> Completion {
    let selection = session.select_artifact(kind).expect("Selection failed");
    let Selection::Requested(pending) = selection else {
        panic!("Expected a request for {kind}, got {selection:?}");
    };
    assert!(session.is_loading());

    let (ticket, outcome) = pending.run(generator).await;
    session.complete_request(ticket, outcome)
}

fn flashcards_payload() -> serde_json::Value {
    json!({
        "topics": [
            {
                "title": "Cells",
                "flashcards": [
                    {"question": "What is ATP?", "answer": "Energy currency"},
                    {"question": "Powerhouse?", "answer": "Mitochondria"}
                ]
            },
            {
                "title": "Genes",
                "flashcards": [["DNA shape?", "Double helix"]]
            }
        ]
    })
}

fn quiz_payload() -> serde_json::Value {
    json!({
        "topics": [{
            "title": "Geography",
            "quizQuestions": [
                {"question": "Capital of Italy?", "options": ["Paris", "London", "Rome", "Berlin"], "answer": "C"},
                {"question": "Largest ocean?", "options": ["Atlantic", "Pacific"], "answer": " b "}
            ]
        }]
    })
}

// ============================================================================
// Successful Generation
// ============================================================================

/// Summary paragraphs from every topic are joined in order.
#[tokio::test]
async fn test_summary_end_to_end() {
    let backend = FakeBackend::spawn(&[(
        "summary",
        Reply::Json(json!({
            "topics": [
                {"title": "One", "summary": ["Cells are small.", "They divide."]},
                {"title": "Two", "summary": "ATP stores energy."}
            ]
        })),
    )])
    .await;
    let generator = HttpGenerator::new(&config_for(&backend)).expect("Failed to build client");

    let mut session = Session::new();
    session.accept_document(document("biology.pdf"));
    assert_eq!(session.stage(), Stage::Choose);

    let completion = select_and_wait(&mut session, &generator, ArtifactKind::Summary).await;
    assert_eq!(completion, Completion::Stored(ArtifactKind::Summary));
    assert_eq!(session.stage(), Stage::Results);
    assert!(!session.is_loading());

    let summary = session
        .results()
        .get(ArtifactKind::Summary)
        .and_then(CanonicalResult::as_summary)
        .expect("Summary missing");
    assert_eq!(summary, "Cells are small.\n\nThey divide.\n\nATP stores energy.");

    let recorded = backend.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].kind, "summary");
    assert_eq!(recorded[0].file_name.as_deref(), Some("biology.pdf"));
    assert_eq!(recorded[0].bytes, b"%PDF-1.4 lecture notes".len());
}

/// Object and pair flashcards from every topic land in one carousel.
#[tokio::test]
async fn test_flashcards_navigation() {
    let backend = FakeBackend::spawn(&[("flashcards", Reply::Json(flashcards_payload()))]).await;
    let generator = HttpGenerator::new(&config_for(&backend)).expect("Failed to build client");

    let mut session = Session::new();
    session.accept_document(document("cells.pdf"));
    let completion = select_and_wait(&mut session, &generator, ArtifactKind::Flashcards).await;
    assert_eq!(completion, Completion::Stored(ArtifactKind::Flashcards));

    let view = session.view();
    let card = view.flashcards.expect("Flashcard view missing");
    assert_eq!(card.total, 3);
    assert_eq!(card.index, 0);
    assert_eq!(card.card.question, "What is ATP?");
    assert!(!card.has_prev);

    assert!(session.navigate(Direction::Next).expect("Navigate failed"));
    assert!(session.navigate(Direction::Next).expect("Navigate failed"));
    assert!(!session.navigate(Direction::Next).expect("Navigate failed"));

    let card = session.view().flashcards.expect("Flashcard view missing");
    assert_eq!(card.index, 2);
    assert_eq!(card.card.answer, "Double helix");
    assert!(!card.has_next);
}

/// Letter answers resolve to option text; picks reveal feedback.
#[tokio::test]
async fn test_quiz_answers_resolved() {
    let backend = FakeBackend::spawn(&[("quiz", Reply::Json(quiz_payload()))]).await;
    let generator = HttpGenerator::new(&config_for(&backend)).expect("Failed to build client");

    let mut session = Session::new();
    session.accept_document(document("geo.pdf"));
    select_and_wait(&mut session, &generator, ArtifactKind::Quiz).await;

    let items = session
        .results()
        .get(ArtifactKind::Quiz)
        .and_then(CanonicalResult::as_quiz)
        .expect("Quiz missing")
        .to_vec();
    assert_eq!(items[0].answer, "Rome");
    assert_eq!(items[1].answer, "Pacific");

    assert!(session.select_quiz_option("Paris").expect("Answer failed"));
    let quiz = session.view().quiz.expect("Quiz view missing");
    assert!(quiz.revealed);
    assert_eq!(
        quiz.feedback,
        Some(QuizFeedback::Incorrect {
            correct_answer: "Rome".to_string()
        })
    );

    session.navigate(Direction::Next).expect("Navigate failed");
    let quiz = session.view().quiz.expect("Quiz view missing");
    assert!(!quiz.revealed);
    assert_eq!(quiz.selected_option, None);
}

/// A kind fetched once is served from the store after going back.
#[tokio::test]
async fn test_cached_kind_not_refetched() {
    let backend = FakeBackend::spawn(&[
        ("flashcards", Reply::Json(flashcards_payload())),
        ("quiz", Reply::Json(quiz_payload())),
    ])
    .await;
    let generator = HttpGenerator::new(&config_for(&backend)).expect("Failed to build client");

    let mut session = Session::new();
    session.accept_document(document("mixed.pdf"));
    select_and_wait(&mut session, &generator, ArtifactKind::Flashcards).await;
    session.go_back().expect("Back failed");
    select_and_wait(&mut session, &generator, ArtifactKind::Quiz).await;
    session.go_back().expect("Back failed");

    let selection = session
        .select_artifact(ArtifactKind::Flashcards)
        .expect("Selection failed");
    assert!(matches!(selection, Selection::Cached));
    assert_eq!(session.stage(), Stage::Results);
    assert_eq!(backend.recorded().len(), 2);
}

// ============================================================================
// Failures
// ============================================================================

/// A 500 from the backend returns to the choose stage with a notice.
#[tokio::test]
async fn test_server_error_returns_to_choose() {
    let backend =
        FakeBackend::spawn(&[("summary", Reply::Status(500, "model unavailable"))]).await;
    let generator = HttpGenerator::new(&config_for(&backend)).expect("Failed to build client");

    let mut session = Session::new();
    session.accept_document(document("notes.pdf"));
    let completion = select_and_wait(&mut session, &generator, ArtifactKind::Summary).await;

    let Completion::Failed(notice) = completion else {
        panic!("Expected a failure, got {completion:?}");
    };
    assert!(notice.message.contains("500"));
    assert!(notice.message.contains("model unavailable"));
    assert_eq!(session.stage(), Stage::Choose);
    assert_eq!(session.selected(), None);
    assert!(!session.is_loading());
    assert!(session.results().get(ArtifactKind::Summary).is_none());
    assert_eq!(session.notice(), Some(&notice));
}

/// A body that is not JSON is a decode failure.
#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let backend = FakeBackend::spawn(&[("quiz", Reply::NotJson)]).await;
    let generator = HttpGenerator::new(&config_for(&backend)).expect("Failed to build client");

    let err = generator
        .generate(&document("notes.pdf"), ArtifactKind::Quiz)
        .await
        .expect_err("Expected a decode error");
    assert!(matches!(
        err,
        CleverlyError::Upstream {
            kind: UpstreamErrorKind::Decode,
            ..
        }
    ));
}

/// A backend slower than the configured timeout fails with `Timeout`.
#[tokio::test]
async fn test_slow_backend_times_out() {
    let backend = FakeBackend::spawn(&[(
        "summary",
        Reply::Delayed(Duration::from_secs(3), json!({"topics": []})),
    )])
    .await;
    let config = Config {
        request_timeout_secs: 1,
        ..config_for(&backend)
    };
    let generator = HttpGenerator::new(&config).expect("Failed to build client");

    let err = generator
        .generate(&document("slow.pdf"), ArtifactKind::Summary)
        .await
        .expect_err("Expected a timeout");
    assert!(matches!(
        err,
        CleverlyError::Upstream {
            kind: UpstreamErrorKind::Timeout,
            ..
        }
    ));
}

/// An `error` field in a 200 body is stored as a content error.
#[tokio::test]
async fn test_backend_error_field_stored() {
    let backend = FakeBackend::spawn(&[(
        "flashcards",
        Reply::Json(json!({"error": "OpenRouter output was not valid JSON."})),
    )])
    .await;
    let generator = HttpGenerator::new(&config_for(&backend)).expect("Failed to build client");

    let mut session = Session::new();
    session.accept_document(document("notes.pdf"));
    let completion = select_and_wait(&mut session, &generator, ArtifactKind::Flashcards).await;
    assert_eq!(completion, Completion::Stored(ArtifactKind::Flashcards));

    let view = session.view();
    assert_eq!(
        view.results.get(ArtifactKind::Flashcards),
        Some(&CanonicalResult::ContentError(
            "OpenRouter output was not valid JSON.".to_string()
        ))
    );
    assert!(text::render_view(&view).contains(text::CONTENT_ERROR_TEXT));
}

/// Removing the document while a request is in flight discards its result.
#[tokio::test]
async fn test_remove_document_discards_in_flight_result() {
    let backend = FakeBackend::spawn(&[(
        "summary",
        Reply::Delayed(
            Duration::from_millis(200),
            json!({"topics": [{"summary": "late"}]}),
        ),
    )])
    .await;
    let generator = HttpGenerator::new(&config_for(&backend)).expect("Failed to build client");

    let mut session = Session::new();
    session.accept_document(document("notes.pdf"));
    let Selection::Requested(pending) = session
        .select_artifact(ArtifactKind::Summary)
        .expect("Selection failed")
    else {
        panic!("Expected a request");
    };

    session.remove_document().expect("Remove failed");
    assert_eq!(session.stage(), Stage::Upload);

    let (ticket, outcome) = pending.run(&generator).await;
    assert!(outcome.is_ok());
    assert_eq!(session.complete_request(ticket, outcome), Completion::Stale);
    assert!(session.results().is_empty());
    assert_eq!(session.stage(), Stage::Upload);
}

// ============================================================================
// Export
// ============================================================================

/// Results gathered over a session export to Markdown and JSON.
#[tokio::test]
async fn test_export_study_sheet() {
    let backend = FakeBackend::spawn(&[
        ("flashcards", Reply::Json(flashcards_payload())),
        ("quiz", Reply::Json(quiz_payload())),
    ])
    .await;
    let generator = HttpGenerator::new(&config_for(&backend)).expect("Failed to build client");

    let mut session = Session::new();
    session.accept_document(document("exam.pdf"));
    select_and_wait(&mut session, &generator, ArtifactKind::Flashcards).await;
    session.go_back().expect("Back failed");
    select_and_wait(&mut session, &generator, ArtifactKind::Quiz).await;

    let sheet = StudySheet::from_results("exam.pdf", session.results());
    assert_eq!(sheet.flashcards.len(), 3);
    assert_eq!(sheet.quiz.len(), 2);
    assert!(sheet.summary.is_none());

    let markdown = MarkdownGenerator::new(&sheet).generate();
    assert!(markdown.contains("# Study Sheet: exam.pdf"));
    assert!(markdown.contains("1. C) Rome"));
    assert!(markdown.contains("2. B) Pacific"));

    let json = JsonGenerator::new(&sheet).generate().expect("JSON export failed");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("Invalid JSON");
    assert_eq!(parsed["quiz"][1]["answer"], "Pacific");
}
