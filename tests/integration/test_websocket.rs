//! Integration tests for the session API and its WebSocket event stream.
//!
//! These tests run the real router on a local port, drive it over HTTP
//! and watch the events pushed to `/ws` clients.

mod fake_backend;

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use cleverly_core::{
    create_router, AppState, ArtifactKind, CanonicalResult, Config, HttpGenerator, SessionEvent,
    SessionView, Stage,
};
use fake_backend::{FakeBackend, Reply};
use futures::SinkExt;
use futures::StreamExt;
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tungstenite::Message;

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Helper type for WebSocket client
type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Addresses of a running test server.
struct TestServer {
    http_url: String,
    ws_url: String,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawns the session API backed by `backend`.
async fn spawn_test_server(backend: &FakeBackend) -> TestServer {
    let config = Config {
        backend_url: backend.url.clone(),
        request_timeout_secs: 5,
        ..Config::default()
    };
    let generator = HttpGenerator::new(&config).expect("Failed to build client");
    let state = AppState::new(config, Arc::new(generator));

    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        http_url: format!("http://{addr}"),
        ws_url: format!("ws://{addr}/ws"),
        _handle: handle,
    }
}

/// Connects a WebSocket client to the given URL.
async fn connect_client(url: &str) -> WsClient {
    let (ws_stream, _) = connect_async(url)
        .await
        .expect("Failed to connect to WebSocket");
    ws_stream
}

/// Receives the next text message from the WebSocket and parses it as a
/// [`SessionEvent`]. Answers ping frames along the way.
async fn receive_event(client: &mut WsClient) -> SessionEvent {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timeout waiting for message")
            .expect("Stream ended")
            .expect("WebSocket error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("Failed to parse event");
            }
            Message::Ping(data) => {
                client
                    .send(Message::Pong(data))
                    .await
                    .expect("Failed to send pong");
            }
            other => panic!("Unexpected message: {other:?}"),
        }
    }
}

/// Receives the next event, which must be `updated`, and returns its view.
async fn receive_update(client: &mut WsClient) -> SessionView {
    match receive_event(client).await {
        SessionEvent::Updated(view) => view,
        other => panic!("Expected Updated event, got: {other:?}"),
    }
}

/// Uploads `bytes` as `name` through `POST /api/document`.
async fn upload(server: &TestServer, name: &str, bytes: &[u8]) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(name.to_string());
    let form = reqwest::multipart::Form::new().part("file", part);
    reqwest::Client::new()
        .post(format!("{}/api/document", server.http_url))
        .multipart(form)
        .send()
        .await
        .expect("Upload request failed")
}

/// Posts a JSON body to an API route.
async fn post_json(server: &TestServer, route: &str, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/api{route}", server.http_url))
        .json(&body)
        .send()
        .await
        .expect("API request failed")
}

// ============================================================================
// Connection Tests
// ============================================================================

/// A new client gets the current session straight away.
#[tokio::test]
async fn test_connected_event_on_connect() {
    let backend = FakeBackend::spawn(&[]).await;
    let server = spawn_test_server(&backend).await;

    let mut client = connect_client(&server.ws_url).await;
    let event = receive_event(&mut client).await;

    let SessionEvent::Connected(view) = event else {
        panic!("Expected Connected event, got: {event:?}");
    };
    assert_eq!(view.stage, Stage::Upload);
    assert!(view.document.is_none());
    assert!(!view.loading);
}

/// A client that connects after an upload sees the document.
#[tokio::test]
async fn test_late_client_sees_current_session() {
    let backend = FakeBackend::spawn(&[]).await;
    let server = spawn_test_server(&backend).await;

    let response = upload(&server, "notes.pdf", b"%PDF-1.4").await;
    assert!(response.status().is_success());

    let mut client = connect_client(&server.ws_url).await;
    let SessionEvent::Connected(view) = receive_event(&mut client).await else {
        panic!("Expected Connected event");
    };
    assert_eq!(view.stage, Stage::Choose);
    assert_eq!(view.document.as_deref(), Some("notes.pdf"));
}

// ============================================================================
// Workflow Events
// ============================================================================

/// Upload, select and completion each push an update to every client.
#[tokio::test]
async fn test_select_flow_broadcasts_updates() {
    let backend = FakeBackend::spawn(&[(
        "summary",
        Reply::Delayed(
            Duration::from_millis(100),
            json!({"topics": [{"summary": ["Cells are small.", "They divide."]}]}),
        ),
    )])
    .await;
    let server = spawn_test_server(&backend).await;

    let mut first = connect_client(&server.ws_url).await;
    let mut second = connect_client(&server.ws_url).await;
    receive_event(&mut first).await; // Consume connected event
    receive_event(&mut second).await;

    let response = upload(&server, "biology.pdf", b"%PDF-1.4 cells").await;
    assert!(response.status().is_success());
    for client in [&mut first, &mut second] {
        let view = receive_update(client).await;
        assert_eq!(view.stage, Stage::Choose);
        assert_eq!(view.document.as_deref(), Some("biology.pdf"));
    }

    let response = post_json(&server, "/select", json!({"kind": "summary"})).await;
    assert!(response.status().is_success());
    let body: SessionView = response.json().await.expect("Invalid session view");
    assert_eq!(body.stage, Stage::Results);
    assert!(body.loading);

    let loading = receive_update(&mut first).await;
    assert!(loading.loading);
    assert_eq!(loading.selected, Some(ArtifactKind::Summary));

    let done = receive_update(&mut first).await;
    assert!(!done.loading);
    assert_eq!(
        done.results.get(ArtifactKind::Summary),
        Some(&CanonicalResult::Summary(
            "Cells are small.\n\nThey divide.".to_string()
        ))
    );

    receive_update(&mut second).await;
    let done = receive_update(&mut second).await;
    assert!(!done.loading);
}

/// A failed request pushes a notice, then the session back in `choose`.
#[tokio::test]
async fn test_failed_request_broadcasts_notice() {
    let backend = FakeBackend::spawn(&[("quiz", Reply::Status(502, "upstream down"))]).await;
    let server = spawn_test_server(&backend).await;

    upload(&server, "notes.pdf", b"%PDF-1.4").await;

    let mut client = connect_client(&server.ws_url).await;
    receive_event(&mut client).await; // Consume connected event

    let response = post_json(&server, "/select", json!({"kind": "quiz"})).await;
    assert!(response.status().is_success());
    let loading = receive_update(&mut client).await;
    assert!(loading.loading);

    let event = receive_event(&mut client).await;
    let SessionEvent::Notice(payload) = event else {
        panic!("Expected Notice event, got: {event:?}");
    };
    assert!(payload.message.contains("502"));
    assert!(payload.message.contains("upstream down"));

    let view = receive_update(&mut client).await;
    assert_eq!(view.stage, Stage::Choose);
    assert_eq!(view.selected, None);
    assert!(!view.loading);
    assert_eq!(view.notice.map(|n| n.message), Some(payload.message));
}

/// Quiz answers and navigation are reflected in pushed updates.
#[tokio::test]
async fn test_quiz_answer_and_navigation_events() {
    let backend = FakeBackend::spawn(&[(
        "quiz",
        Reply::Json(json!({
            "topics": [{"quiz": [
                {"question": "Capital of Italy?", "options": ["Paris", "Rome"], "answer": "B"},
                {"question": "2 + 2?", "options": ["3", "4"], "answer": "4"}
            ]}]
        })),
    )])
    .await;
    let server = spawn_test_server(&backend).await;
    upload(&server, "quiz.pdf", b"%PDF-1.4").await;

    let mut client = connect_client(&server.ws_url).await;
    receive_event(&mut client).await; // Consume connected event

    post_json(&server, "/select", json!({"kind": "quiz"})).await;
    receive_update(&mut client).await; // Loading
    let ready = receive_update(&mut client).await;
    let quiz = ready.quiz.expect("Quiz view missing");
    assert_eq!(quiz.total, 2);
    assert_eq!(quiz.item.answer, "Rome");

    let response = post_json(&server, "/answer", json!({"option": "Rome"})).await;
    assert!(response.status().is_success());
    let answered = receive_update(&mut client).await;
    let quiz = answered.quiz.expect("Quiz view missing");
    assert!(quiz.revealed);
    assert_eq!(quiz.selected_option.as_deref(), Some("Rome"));

    let response = post_json(&server, "/navigate", json!({"direction": "next"})).await;
    assert!(response.status().is_success());
    let moved = receive_update(&mut client).await;
    let quiz = moved.quiz.expect("Quiz view missing");
    assert_eq!(quiz.index, 1);
    assert!(!quiz.revealed);
}

// ============================================================================
// Rejections
// ============================================================================

/// Selecting before any upload is a conflict and changes nothing.
#[tokio::test]
async fn test_select_without_document_is_conflict() {
    let backend = FakeBackend::spawn(&[]).await;
    let server = spawn_test_server(&backend).await;

    let response = post_json(&server, "/select", json!({"kind": "flashcards"})).await;
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);

    let body: serde_json::Value = response.json().await.expect("Invalid error body");
    assert!(body["error"].as_str().is_some());
    assert!(backend.recorded().is_empty());
}

/// Unknown kinds and empty uploads are bad requests.
#[tokio::test]
async fn test_bad_requests() {
    let backend = FakeBackend::spawn(&[]).await;
    let server = spawn_test_server(&backend).await;

    let response = upload(&server, "empty.pdf", b"").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    upload(&server, "notes.pdf", b"%PDF-1.4").await;
    let response = post_json(&server, "/select", json!({"kind": "essay"})).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

/// Removing the document returns every client to the upload stage.
#[tokio::test]
async fn test_remove_document_broadcasts_upload_stage() {
    let backend = FakeBackend::spawn(&[]).await;
    let server = spawn_test_server(&backend).await;
    upload(&server, "notes.pdf", b"%PDF-1.4").await;

    let mut client = connect_client(&server.ws_url).await;
    receive_event(&mut client).await; // Consume connected event

    let response = reqwest::Client::new()
        .delete(format!("{}/api/document", server.http_url))
        .send()
        .await
        .expect("Delete request failed");
    assert!(response.status().is_success());

    let view = receive_update(&mut client).await;
    assert_eq!(view.stage, Stage::Upload);
    assert!(view.document.is_none());
    assert!(view.results.is_empty());
}
