//! HTTP API for driving a study session.
//!
//! A presentation layer (browser, terminal, tests) issues user intents here
//! and reads back [`SessionView`] snapshots. Every mutating route answers
//! with the view after the change and broadcasts it on `/ws`.
//!
//! # Endpoints
//!
//! - `GET /api/session` - Current session view
//! - `POST /api/document` - Upload a document (multipart field `file`)
//! - `DELETE /api/document` - Remove the document
//! - `POST /api/select` - Select an artifact kind
//! - `POST /api/navigate` - Move the current carousel
//! - `POST /api/answer` - Answer the current quiz question
//! - `POST /api/back` - Return to the artifact choice
//! - `GET /ws` - WebSocket stream of session events
//!
//! # Example
//!
//! ```no_run
//! use cleverly_core::{create_router, AppState, Config, HttpGenerator};
//! use std::sync::Arc;
//!
//! # async fn example() -> cleverly_core::Result<()> {
//! let config = Config::default();
//! let generator = HttpGenerator::new(&config)?;
//! let state = AppState::new(config, Arc::new(generator));
//!
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::carousel::Direction;
use crate::client::Generator;
use crate::config::Config;
use crate::document::{UploadedDocument, DEFAULT_DOCUMENT_NAME};
use crate::error::CleverlyError;
use crate::events::{ws_handler, EventBroadcaster, SessionEvent};
use crate::workflow::{Completion, PendingRequest, Selection, Session, SessionView};
use crate::ArtifactKind;

/// Extra room on top of the document limit for multipart framing.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for `POST /api/select`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectRequest {
    /// One of `flashcards`, `quiz`, `summary` (case-insensitive).
    pub kind: String,
}

/// Request body for `POST /api/navigate`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NavigateRequest {
    /// `next` or `prev`.
    pub direction: Direction,
}

/// Request body for `POST /api/answer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    /// The option text picked.
    pub option: String,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration.
    pub config: Config,
    /// The single study session served by this process.
    pub session: Arc<Mutex<Session>>,
    /// Source of generated study material.
    pub generator: Arc<dyn Generator>,
    /// Fan-out of session events to WebSocket clients.
    pub broadcaster: EventBroadcaster,
}

impl AppState {
    /// Creates state with a fresh session.
    #[must_use]
    pub fn new(config: Config, generator: Arc<dyn Generator>) -> Self {
        let broadcaster = EventBroadcaster::new(config.event_buffer_size);
        Self {
            config,
            session: Arc::new(Mutex::new(Session::new())),
            generator,
            broadcaster,
        }
    }

    /// Broadcasts the current view of `session`.
    fn publish(&self, session: &Session) -> SessionView {
        let view = session.view();
        self.broadcaster.send(SessionEvent::updated(view.clone()));
        view
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("subscribers", &self.broadcaster.receiver_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The request is malformed.
    BadRequest(String),
    /// The session is not in a state that accepts this request.
    Conflict(String),
    /// The uploaded document is over the size limit.
    PayloadTooLarge(String),
    /// Anything else.
    Internal(String),
}

impl From<CleverlyError> for ApiError {
    fn from(err: CleverlyError) -> Self {
        match err {
            e if e.is_precondition() => Self::Conflict(e.to_string()),
            e @ CleverlyError::DocumentTooLarge { .. } => Self::PayloadTooLarge(e.to_string()),
            e @ (CleverlyError::DocumentEmpty { .. }
            | CleverlyError::UnknownArtifactKind(_)
            | CleverlyError::UnknownDirection(_)) => Self::BadRequest(e.to_string()),
            e => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints and `/ws`.
///
/// Request bodies are capped at the document limit plus multipart framing.
pub fn create_router(state: AppState) -> Router {
    // Configure CORS for development (allow all origins)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state
        .config
        .max_document_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .route("/session", get(handle_session))
        .route(
            "/document",
            post(handle_upload).delete(handle_remove_document),
        )
        .route("/select", post(handle_select))
        .route("/navigate", post(handle_navigate))
        .route("/answer", post(handle_answer))
        .route("/back", post(handle_back));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(ws_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `GET /api/session`.
async fn handle_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(state.session.lock().await.view())
}

/// Handler for `POST /api/document`.
///
/// Reads the `file` field, checks its size and accepts it into the session.
async fn handle_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(&e.body_text(), e.status()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .unwrap_or(DEFAULT_DOCUMENT_NAME)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error(&e.body_text(), e.status()))?;
        upload = Some((name, bytes));
        break;
    }

    let Some((name, bytes)) = upload else {
        return Err(ApiError::BadRequest(
            "Missing multipart field 'file'".to_string(),
        ));
    };

    let document =
        UploadedDocument::from_bytes(name, bytes.to_vec(), state.config.max_document_bytes())?;

    let mut session = state.session.lock().await;
    session.accept_document(document);
    Ok(Json(state.publish(&session)))
}

/// Maps a multipart failure to a 413 when the body was cut off by the
/// size limit, and a 400 otherwise.
fn upload_error(message: &str, status: StatusCode) -> ApiError {
    warn!(status = %status, "Rejected document upload: {}", message);
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message.to_string())
    } else {
        ApiError::BadRequest(message.to_string())
    }
}

/// Handler for `DELETE /api/document`.
async fn handle_remove_document(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionView>, ApiError> {
    let mut session = state.session.lock().await;
    session.remove_document()?;
    Ok(Json(state.publish(&session)))
}

/// Handler for `POST /api/select`.
///
/// Switches to the results stage right away; the generation request runs in
/// a background task and its outcome arrives on `/ws`.
async fn handle_select(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let kind: ArtifactKind = request.kind.parse()?;

    let mut session = state.session.lock().await;
    let selection = session.select_artifact(kind)?;
    let view = state.publish(&session);
    drop(session);

    if let Selection::Requested(pending) = selection {
        let state = Arc::clone(&state);
        tokio::spawn(async move { run_request(state, pending).await });
    }

    Ok(Json(view))
}

/// Runs a generation request and applies its outcome to the session.
///
/// The session lock is only taken after the request has finished.
async fn run_request(state: Arc<AppState>, pending: PendingRequest) {
    let (ticket, outcome) = pending.run(state.generator.as_ref()).await;

    let mut session = state.session.lock().await;
    match session.complete_request(ticket, outcome) {
        Completion::Stored(kind) => {
            info!(kind = %kind, generation = ticket.generation, "Request completed");
            state.publish(&session);
        }
        Completion::Failed(notice) => {
            state.broadcaster.send(SessionEvent::notice(&notice));
            state.publish(&session);
        }
        Completion::Stale => {}
    }
}

/// Handler for `POST /api/navigate`.
async fn handle_navigate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NavigateRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let mut session = state.session.lock().await;
    if session.navigate(request.direction)? {
        return Ok(Json(state.publish(&session)));
    }
    Ok(Json(session.view()))
}

/// Handler for `POST /api/answer`.
async fn handle_answer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let mut session = state.session.lock().await;
    if session.select_quiz_option(&request.option)? {
        return Ok(Json(state.publish(&session)));
    }
    Ok(Json(session.view()))
}

/// Handler for `POST /api/back`.
async fn handle_back(State(state): State<Arc<AppState>>) -> Result<Json<SessionView>, ApiError> {
    let mut session = state.session.lock().await;
    session.go_back()?;
    Ok(Json(state.publish(&session)))
}

// ============================================================================
// Tests
// ============================================================================
