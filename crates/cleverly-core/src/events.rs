//! WebSocket event types and broadcasting for live session updates.
//!
//! Every change to the session is pushed to connected clients as a full
//! [`SessionView`], so a client never has to reconcile partial updates.
//!
//! # Event Types
//!
//! - `connected` - Sent when a client connects, includes the current view
//! - `updated` - The session changed
//! - `notice` - A generation request failed
//!
//! # Example
//!
//! ```no_run
//! use cleverly_core::events::{EventBroadcaster, SessionEvent};
//! use cleverly_core::Session;
//!
//! # async fn example() {
//! let broadcaster = EventBroadcaster::new(100);
//! let mut receiver = broadcaster.subscribe();
//!
//! broadcaster.send(SessionEvent::updated(Session::new().view()));
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {}", event.event_name());
//! }
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::workflow::{Notice, SessionView};

// ============================================================================
// Events
// ============================================================================

/// Payload for the `notice` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticePayload {
    /// Human-readable error text.
    pub message: String,
    /// When the failure happened.
    pub timestamp: DateTime<Utc>,
}

/// Session events pushed to WebSocket clients.
///
/// Serialized as JSON objects with "event" and "payload" fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Sent when a client connects.
    Connected(SessionView),
    /// Sent after every session change.
    Updated(SessionView),
    /// Sent when a generation request fails.
    Notice(NoticePayload),
}

impl SessionEvent {
    /// Creates a `Connected` event.
    #[must_use]
    pub const fn connected(view: SessionView) -> Self {
        Self::Connected(view)
    }

    /// Creates an `Updated` event.
    #[must_use]
    pub const fn updated(view: SessionView) -> Self {
        Self::Updated(view)
    }

    /// Creates a `Notice` event from a session notice.
    #[must_use]
    pub fn notice(notice: &Notice) -> Self {
        Self::Notice(NoticePayload {
            message: notice.message.clone(),
            timestamp: notice.at,
        })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Updated(_) => "updated",
            Self::Notice(_) => "notice",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts session events to all connected WebSocket clients.
///
/// Events are not kept for clients that connect later; they get the current
/// view in their `connected` event instead.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster buffering `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Creates a new subscriber.
    ///
    /// A subscriber that falls behind receives a `Lagged` error and misses
    /// some events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event, returning the number of receivers.
    pub fn send(&self, event: SessionEvent) -> usize {
        // Err only means nobody is listening.
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

// ============================================================================
// WebSocket Handler
// ============================================================================

/// Interval between heartbeat pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Unanswered pings tolerated before the stream is closed.
const MAX_MISSED_PONGS: u8 = 3;

/// Handler for `GET /ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    debug!("Upgrading session event stream");
    ws.on_upgrade(move |socket| stream_session(socket, state))
}

/// Encodes an event as a text frame.
fn encode(event: &SessionEvent) -> Option<Message> {
    serde_json::to_string(event)
        .map(Message::Text)
        .map_err(|e| warn!(event = event.event_name(), "Failed to encode session event: {}", e))
        .ok()
}

/// Streams session events to one client.
///
/// The client first gets `connected` with the current view, then every
/// broadcast event. A ping goes out each heartbeat; the stream ends when
/// the client leaves or misses [`MAX_MISSED_PONGS`] in a row.
async fn stream_session(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut incoming) = socket.split();

    // Subscribe before reading the view so no update falls in between.
    let mut events = state.broadcaster.subscribe();
    let view = state.session.lock().await.view();

    let Some(first) = encode(&SessionEvent::connected(view)) else {
        return;
    };
    if sink.send(first).await.is_err() {
        return;
    }
    info!(subscribers = state.broadcaster.receiver_count(), "Session client connected");

    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut missed_pongs = 0u8;

    loop {
        let outgoing = tokio::select! {
            frame = incoming.next() => match frame {
                Some(Ok(Message::Pong(_))) => {
                    missed_pongs = 0;
                    continue;
                }
                Some(Ok(Message::Ping(data))) => Message::Pong(data),
                Some(Ok(Message::Text(_) | Message::Binary(_))) => continue,
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
            },

            event = events.recv() => match event {
                Ok(event) => match encode(&event) {
                    Some(message) => message,
                    None => continue,
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session client fell behind");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            _ = heartbeat.tick() => {
                missed_pongs += 1;
                if missed_pongs > MAX_MISSED_PONGS {
                    debug!("Session client stopped answering pings");
                    break;
                }
                Message::Ping(Vec::new())
            }
        };

        if sink.send(outgoing).await.is_err() {
            break;
        }
    }

    info!("Session client disconnected");
}

// ============================================================================
// Tests
// ============================================================================
