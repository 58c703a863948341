//! Request handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use blotter_core::{CurvePoint, PortfolioSnapshot, Position};
use blotter_engine::{EngineHealth, MarketEngine, MarketSummary, SchedulerState, UpdateScheduler};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ServerError;
use crate::websocket::WebSocketState;

/// Application state.
pub struct AppState {
    /// The market engine
    pub engine: Arc<MarketEngine>,
    /// Periodic update driver
    pub scheduler: Arc<UpdateScheduler>,
    /// WebSocket state for real-time streaming
    pub ws_state: WebSocketState,
}

// =============================================================================
// HEALTH
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` after repeated failed ticks
    pub status: String,
    /// Server version
    pub version: String,
    /// Update scheduler state
    pub scheduler: SchedulerState,
    /// Sequence of the current snapshot
    pub sequence: u64,
    /// Publication time of the current snapshot
    pub last_update: DateTime<Utc>,
    /// Tick counters
    pub engine: EngineHealth,
}

/// Health check handler.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let engine = state.engine.health();
    let snapshot = state.engine.read();

    Json(HealthResponse {
        status: if engine.degraded { "degraded" } else { "ok" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        scheduler: state.scheduler.state(),
        sequence: snapshot.sequence,
        last_update: snapshot.as_of,
        engine,
    })
}

// =============================================================================
// MARKET DATA
// =============================================================================

/// Current yield curve: SOD and live yields with bp deltas per tenor.
pub async fn get_curve(State(state): State<Arc<AppState>>) -> Json<Vec<CurvePoint>> {
    Json(state.engine.read().curve.clone())
}

/// Current positions with live PV and P&L.
pub async fn get_positions(State(state): State<Arc<AppState>>) -> Json<Vec<Position>> {
    Json(state.engine.read().positions.clone())
}

/// Portfolio P&L response.
#[derive(Debug, Serialize, Deserialize)]
pub struct PnlResponse {
    /// Sum of position P&L
    pub total_pnl: f64,
    /// Positions with P&L
    pub positions: Vec<Position>,
    /// Publication time of the snapshot
    pub timestamp: DateTime<Utc>,
    /// Snapshot sequence
    pub sequence: u64,
}

/// Portfolio P&L.
pub async fn get_pnl(State(state): State<Arc<AppState>>) -> Json<PnlResponse> {
    let snapshot = state.engine.read();
    Json(PnlResponse {
        total_pnl: snapshot.total_pnl,
        positions: snapshot.positions.clone(),
        timestamp: snapshot.as_of,
        sequence: snapshot.sequence,
    })
}

/// Market and portfolio summary.
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<MarketSummary> {
    Json(state.engine.summary())
}

/// Full current snapshot.
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<PortfolioSnapshot> {
    Json(state.engine.read().as_ref().clone())
}

// =============================================================================
// RESET
// =============================================================================

/// Reset response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    /// Always `success`
    pub status: String,
    /// Description of what was reset
    pub message: String,
    /// Publication time of the reset snapshot
    pub timestamp: DateTime<Utc>,
    /// Sequence of the reset snapshot
    pub sequence: u64,
}

/// Reset the curve to start of day, zeroing all P&L.
pub async fn reset(State(state): State<Arc<AppState>>) -> Result<Json<ResetResponse>, ServerError> {
    let snapshot = state.engine.reset()?;
    info!("Reset requested via API");

    Ok(Json(ResetResponse {
        status: "success".to_string(),
        message: "Curve reset to start-of-day values".to_string(),
        timestamp: snapshot.as_of,
        sequence: snapshot.sequence,
    }))
}
