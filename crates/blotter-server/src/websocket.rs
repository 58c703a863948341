//! WebSocket streaming of portfolio snapshots.
//!
//! Each connection:
//! - receives `connected`, then the current snapshot, then every later
//!   snapshot in sequence order
//! - may send `ping` and gets `pong`
//! - gets a heartbeat when idle
//!
//! A send that does not complete within the configured timeout closes the
//! connection and releases its engine subscription.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use blotter_core::PortfolioSnapshot;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{interval_at, timeout};
use tracing::{debug, info, warn};

use crate::handlers::AppState;

/// Default bound on a single WebSocket send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(1);

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

// =============================================================================
// MESSAGE TYPES
// =============================================================================

/// Inbound WebSocket message from client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Client heartbeat
    Ping {
        /// Client clock, echoed back
        #[serde(default)]
        timestamp: i64,
    },
}

/// Outbound WebSocket message to client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ServerMessage<'a> {
    /// Connection established
    Connected {
        session_id: String,
        server_time: i64,
    },
    /// Published portfolio snapshot
    Snapshot(&'a PortfolioSnapshot),
    /// Reply to a client ping
    Pong { timestamp: i64, server_time: i64 },
    /// Error message
    Error { code: String, message: String },
    /// Server heartbeat
    Heartbeat { server_time: i64 },
}

// =============================================================================
// WEBSOCKET STATE
// =============================================================================

/// WebSocket connection state manager.
pub struct WebSocketState {
    /// Active connections count
    connection_count: AtomicUsize,
    /// Session ID counter
    session_counter: AtomicU64,
    send_timeout: Duration,
    started_at: Instant,
}

impl WebSocketState {
    /// Create a new WebSocket state manager.
    pub fn new() -> Self {
        Self::with_send_timeout(DEFAULT_SEND_TIMEOUT)
    }

    /// Create a state manager with a specific send timeout.
    pub fn with_send_timeout(send_timeout: Duration) -> Self {
        Self {
            connection_count: AtomicUsize::new(0),
            session_counter: AtomicU64::new(0),
            send_timeout,
            started_at: Instant::now(),
        }
    }

    /// Generate a new session ID.
    pub fn next_session_id(&self) -> String {
        let id = self.session_counter.fetch_add(1, Ordering::SeqCst);
        format!("ws-{}", id)
    }

    /// Get active connection count.
    pub fn active_connections(&self) -> usize {
        self.connection_count.load(Ordering::SeqCst)
    }

    /// Upper bound on a single send.
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }
}

impl Default for WebSocketState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// WEBSOCKET HANDLER
// =============================================================================

/// Why a send to the client failed.
#[derive(Debug, Error)]
enum SendError {
    #[error("send timed out after {0:?}")]
    Timeout(Duration),
    #[error("socket error: {0}")]
    Socket(#[from] axum::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

type WsSender = SplitSink<WebSocket, Message>;

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let ws_state = &state.ws_state;
    let send_timeout = ws_state.send_timeout();

    let session_id = ws_state.next_session_id();
    ws_state.connection_count.fetch_add(1, Ordering::SeqCst);

    // Subscribe before reading the current snapshot so nothing published in
    // between is missed; anything at or below it is skipped.
    let mut subscription = state.engine.subscribe();
    let current = state.engine.read();
    subscription.skip_through(current.sequence);
    info!(
        "WebSocket connection established: {} ({})",
        session_id,
        subscription.id()
    );

    let (mut sender, mut receiver) = socket.split();

    let connected = ServerMessage::Connected {
        session_id: session_id.clone(),
        server_time: current_timestamp(),
    };
    let greeted = match send_message(&mut sender, &connected, send_timeout).await {
        Ok(()) => send_message(&mut sender, &ServerMessage::Snapshot(&current), send_timeout).await,
        Err(e) => Err(e),
    };
    drop(current);

    if let Err(e) = greeted {
        warn!("Failed to greet {}: {}", session_id, e);
    } else {
        let mut heartbeat =
            interval_at(tokio::time::Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);

        loop {
            tokio::select! {
                msg = receiver.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let reply = handle_client_message(&text);
                            if let Err(e) = send_message(&mut sender, &reply, send_timeout).await {
                                warn!("Closing {}: {}", session_id, e);
                                break;
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if sender.send(Message::Pong(data)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("WebSocket closed by client: {}", session_id);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!("WebSocket error for {}: {}", session_id, e);
                            break;
                        }
                    }
                }

                update = subscription.recv() => {
                    let Some(snapshot) = update else {
                        warn!("Subscription for {} dropped by the engine", session_id);
                        let lagging = ServerMessage::Error {
                            code: "LAGGING".to_string(),
                            message: "client fell too far behind".to_string(),
                        };
                        let _ = send_message(&mut sender, &lagging, send_timeout).await;
                        break;
                    };
                    if let Err(e) =
                        send_message(&mut sender, &ServerMessage::Snapshot(&snapshot), send_timeout).await
                    {
                        warn!("Closing {} at sequence {}: {}", session_id, snapshot.sequence, e);
                        break;
                    }
                    heartbeat.reset();
                }

                _ = heartbeat.tick() => {
                    let beat = ServerMessage::Heartbeat { server_time: current_timestamp() };
                    if let Err(e) = send_message(&mut sender, &beat, send_timeout).await {
                        warn!("Closing {}: {}", session_id, e);
                        break;
                    }
                }
            }
        }
    }

    // Cleanup
    state.engine.unsubscribe(subscription.id());
    ws_state.connection_count.fetch_sub(1, Ordering::SeqCst);
    info!("WebSocket connection closed: {}", session_id);
}

/// Build the reply to a client text message.
fn handle_client_message(text: &str) -> ServerMessage<'static> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping { timestamp }) => ServerMessage::Pong {
            timestamp,
            server_time: current_timestamp(),
        },
        Err(e) => {
            debug!("Invalid client message: {}", e);
            ServerMessage::Error {
                code: "INVALID_MESSAGE".to_string(),
                message: format!("Invalid message: {}", e),
            }
        }
    }
}

/// Send a server message over WebSocket, bounded by `limit`.
async fn send_message(
    sender: &mut WsSender,
    msg: &ServerMessage<'_>,
    limit: Duration,
) -> Result<(), SendError> {
    let json = serde_json::to_string(msg)?;
    timeout(limit, sender.send(Message::Text(json)))
        .await
        .map_err(|_| SendError::Timeout(limit))??;
    Ok(())
}

/// Current timestamp in milliseconds.
fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// =============================================================================
// WEBSOCKET STATUS ENDPOINT
// =============================================================================

/// Response for WebSocket status endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebSocketStatus {
    /// Number of active connections
    pub active_connections: usize,
    /// Engine subscribers, including non-WebSocket ones
    pub subscribers: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
}

/// Get WebSocket status.
pub async fn ws_status(State(state): State<Arc<AppState>>) -> Json<WebSocketStatus> {
    Json(WebSocketStatus {
        active_connections: state.ws_state.active_connections(),
        subscribers: state.engine.subscribers().len(),
        uptime_seconds: state.ws_state.started_at.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use blotter_core::CurveParameters;
    use serde_json::Value;

    #[test]
    fn test_client_message_ping() {
        let json = r#"{"type":"ping","timestamp":1234567890}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        let ClientMessage::Ping { timestamp } = msg;
        assert_eq!(timestamp, 1234567890);
    }

    #[test]
    fn test_ping_reply() {
        let reply = handle_client_message(r#"{"type":"ping","timestamp":42}"#);
        let json: Value = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "pong");
        assert_eq!(json["timestamp"], 42);
        assert!(json["server_time"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_invalid_message_reply() {
        let reply = handle_client_message(r#"{"type":"subscribe"}"#);
        let json: Value = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "INVALID_MESSAGE");
    }

    #[test]
    fn test_server_message_connected() {
        let msg = ServerMessage::Connected {
            session_id: "ws-123".to_string(),
            server_time: 1234567890,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"connected\""));
        assert!(json.contains("\"session_id\":\"ws-123\""));
    }

    #[test]
    fn test_snapshot_message_is_flat() {
        let mut snapshot =
            PortfolioSnapshot::new(CurveParameters::default(), Vec::new(), Vec::new(), 12.5);
        snapshot.sequence = 9;

        let json: Value = serde_json::to_value(ServerMessage::Snapshot(&snapshot)).unwrap();
        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["sequence"], 9);
        assert_eq!(json["total_pnl"], 12.5);
        assert!(json["curve"].is_array());
    }

    #[test]
    fn test_websocket_state_session_id() {
        let state = WebSocketState::new();
        let id1 = state.next_session_id();
        let id2 = state.next_session_id();
        assert!(id1.starts_with("ws-"));
        assert_ne!(id1, id2);
        assert_eq!(state.active_connections(), 0);
        assert_eq!(state.send_timeout(), DEFAULT_SEND_TIMEOUT);
    }
}
