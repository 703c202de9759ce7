//! A stand-in generation backend for integration tests.
//!
//! Serves `POST /upload`, records each request's `type` field and file
//! name, and answers with a canned reply per artifact kind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;

/// What the backend answers for a kind.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Reply {
    /// 200 with a JSON body.
    Json(Value),
    /// A non-success status with a plain-text body.
    Status(u16, &'static str),
    /// 200 with a body that is not JSON.
    NotJson,
    /// 200 with a JSON body, after a pause.
    Delayed(Duration, Value),
}

/// One request as the backend saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    /// The `type` form field.
    pub kind: String,
    /// File name of the `file` part.
    pub file_name: Option<String>,
    /// Size of the `file` part.
    pub bytes: usize,
}

#[derive(Clone)]
struct BackendState {
    replies: Arc<HashMap<String, Reply>>,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

/// A running fake backend.
pub struct FakeBackend {
    /// Base URL to use as `backendUrl`.
    pub url: String,
    recorded: Arc<Mutex<Vec<Recorded>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeBackend {
    /// Starts a backend answering each kind with its reply.
    ///
    /// Kinds without a reply get a 404.
    pub async fn spawn(replies: &[(&str, Reply)]) -> Self {
        let replies: HashMap<String, Reply> = replies
            .iter()
            .map(|(kind, reply)| ((*kind).to_string(), reply.clone()))
            .collect();
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let state = BackendState {
            replies: Arc::new(replies),
            recorded: Arc::clone(&recorded),
        };

        let router = Router::new()
            .route("/upload", post(handle_upload))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Fake backend failed");
        });

        Self {
            url: format!("http://{addr}"),
            recorded,
            _handle: handle,
        }
    }

    /// Requests received so far.
    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().expect("Lock poisoned").clone()
    }
}

async fn handle_upload(State(state): State<BackendState>, mut multipart: Multipart) -> Response {
    let mut kind = String::new();
    let mut file_name = None;
    let mut bytes = 0;

    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name() {
            Some("type") => kind = field.text().await.unwrap_or_default(),
            Some("file") => {
                file_name = field.file_name().map(ToString::to_string);
                bytes = field.bytes().await.map(|b| b.len()).unwrap_or_default();
            }
            _ => {}
        }
    }

    state.recorded.lock().expect("Lock poisoned").push(Recorded {
        kind: kind.clone(),
        file_name,
        bytes,
    });

    match state.replies.get(&kind).cloned() {
        Some(Reply::Json(body)) => Json(body).into_response(),
        Some(Reply::Status(code, body)) => {
            let status = StatusCode::from_u16(code).expect("Invalid status code");
            (status, body).into_response()
        }
        Some(Reply::NotJson) => (StatusCode::OK, "<html>not json</html>").into_response(),
        Some(Reply::Delayed(delay, body)) => {
            tokio::time::sleep(delay).await;
            Json(body).into_response()
        }
        None => (StatusCode::NOT_FOUND, "unknown type").into_response(),
    }
}
