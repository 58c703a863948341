//! Route definitions.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;

use blotter_engine::{MarketEngine, UpdateScheduler};

use crate::handlers::{self, AppState};
use crate::websocket::{self, WebSocketState, DEFAULT_SEND_TIMEOUT};

/// Create the API router.
///
/// # Arguments
/// * `engine` - The market engine
/// * `scheduler` - The update scheduler driving `engine`
pub fn create_router(engine: Arc<MarketEngine>, scheduler: Arc<UpdateScheduler>) -> Router {
    create_router_with_send_timeout(engine, scheduler, DEFAULT_SEND_TIMEOUT)
}

/// Create the API router with a specific WebSocket send timeout.
pub fn create_router_with_send_timeout(
    engine: Arc<MarketEngine>,
    scheduler: Arc<UpdateScheduler>,
    send_timeout: Duration,
) -> Router {
    let state = Arc::new(AppState {
        engine,
        scheduler,
        ws_state: WebSocketState::with_send_timeout(send_timeout),
    });

    Router::new()
        // Health
        .route("/health", get(handlers::health))
        .route("/api/v1/health", get(handlers::health))
        // Market
        .route("/api/v1/curve", get(handlers::get_curve))
        .route("/api/v1/positions", get(handlers::get_positions))
        .route("/api/v1/pnl", get(handlers::get_pnl))
        .route("/api/v1/summary", get(handlers::get_summary))
        .route("/api/v1/snapshot", get(handlers::get_snapshot))
        .route("/api/v1/reset", post(handlers::reset))
        // WebSocket
        .route("/ws", get(websocket::ws_handler))
        .route("/api/v1/ws/stream", get(websocket::ws_handler))
        .route("/api/v1/ws/status", get(websocket::ws_status))
        // State
        .with_state(state)
}
