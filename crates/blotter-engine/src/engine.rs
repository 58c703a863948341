//! The market engine.
//!
//! Owns the drift process, shared state and subscriber registry. `tick` and
//! `reset` both run under the drift lock, so snapshots are published and
//! fanned out in sequence order no matter which caller produced them.

use std::sync::Arc;

use blotter_core::{CurveParameters, PnlSummary, PortfolioSnapshot, Position};
use blotter_curves::{delta_map, evaluate_curve, DriftProcess};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fanout::{SubscriberId, SubscriberRegistry, Subscription};
use crate::health::{EngineHealth, HealthTracker};
use crate::pnl::{aggregate_pnl, compute_pnl};
use crate::state::MarketState;

/// Current market and portfolio aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    /// Sequence of the snapshot summarised
    pub sequence: u64,
    /// Publication time of that snapshot
    pub timestamp: DateTime<Utc>,
    /// Live curve parameters
    pub curve_parameters: CurveParameters,
    /// Start-of-day curve parameters
    pub sod_curve_parameters: CurveParameters,
    /// Largest absolute curve move in basis points
    pub max_abs_delta_bp: f64,
    /// Per-tick drift volatility
    pub volatility: f64,
    /// Portfolio aggregates
    #[serde(flatten)]
    pub pnl: PnlSummary,
}

/// The live market and the portfolio valued against it.
#[derive(Debug)]
pub struct MarketEngine {
    config: EngineConfig,
    positions: Vec<Position>,
    drift: Mutex<DriftProcess>,
    state: MarketState,
    subscribers: SubscriberRegistry,
    health: HealthTracker,
}

impl MarketEngine {
    /// Creates an engine at start of day.
    ///
    /// The initial snapshot (sequence 1) has every delta and P&L at zero.
    pub fn new(
        config: EngineConfig,
        sod: CurveParameters,
        positions: Vec<Position>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let drift = DriftProcess::build(sod, config.volatility, config.seed)?;
        let initial = build_snapshot(&sod, &sod, &positions)?;

        info!(
            "Market engine '{}' ready: {} positions, tick every {:?}",
            config.name,
            positions.len(),
            config.tick_interval()
        );

        Ok(Self {
            health: HealthTracker::new(config.degraded_after),
            state: MarketState::new(sod, initial),
            drift: Mutex::new(drift),
            subscribers: SubscriberRegistry::new(),
            positions,
            config,
        })
    }

    /// Advances the market one step and publishes the result.
    ///
    /// Drifted parameters are committed only once the snapshot built from
    /// them is complete; on error the previous snapshot stays current.
    pub fn tick(&self) -> Result<Arc<PortfolioSnapshot>, EngineError> {
        let mut drift = self.drift.lock();
        let proposed = drift.propose()?;
        let snapshot = build_snapshot(drift.sod(), &proposed, &self.positions)?;
        drift.commit(proposed);

        let published = self.publish_and_notify(snapshot);
        drop(drift);

        debug!(
            "Tick {}: max |delta| {:.4}bp, total P&L {:.2}",
            published.sequence,
            published.max_abs_delta_bp(),
            published.total_pnl
        );
        Ok(published)
    }

    /// Returns the market to start of day and publishes the zero snapshot.
    ///
    /// Safe to call whether or not the scheduler is running.
    pub fn reset(&self) -> Result<Arc<PortfolioSnapshot>, EngineError> {
        let mut drift = self.drift.lock();
        drift.reset_to_sod();
        let sod = *drift.sod();
        let snapshot = build_snapshot(&sod, &sod, &self.positions)?;

        let published = self.publish_and_notify(snapshot);
        drop(drift);

        info!("Market reset to start of day at sequence {}", published.sequence);
        Ok(published)
    }

    fn publish_and_notify(&self, snapshot: PortfolioSnapshot) -> Arc<PortfolioSnapshot> {
        let published = self.state.publish(snapshot);
        let report = self.subscribers.notify(&published);
        if !report.dropped.is_empty() {
            debug!(
                "Snapshot {} delivered to {} subscribers, {} dropped",
                published.sequence,
                report.delivered,
                report.dropped.len()
            );
        }
        published
    }

    /// Latest published snapshot.
    pub fn read(&self) -> Arc<PortfolioSnapshot> {
        self.state.read()
    }

    /// Opens a streaming subscription buffered per the engine configuration.
    pub fn subscribe(&self) -> Subscription {
        self.subscribers.subscribe(self.config.subscriber_buffer)
    }

    /// Ends a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.subscribers.unregister(id)
    }

    /// Tick outcome counters.
    pub fn health(&self) -> EngineHealth {
        self.health.snapshot()
    }

    /// Aggregates over the latest snapshot.
    pub fn summary(&self) -> MarketSummary {
        let snapshot = self.read();
        MarketSummary {
            sequence: snapshot.sequence,
            timestamp: snapshot.as_of,
            curve_parameters: snapshot.parameters,
            sod_curve_parameters: *self.state.sod(),
            max_abs_delta_bp: snapshot.max_abs_delta_bp(),
            volatility: self.drift.lock().volatility(),
            pnl: snapshot.summary(),
        }
    }

    /// Start-of-day curve parameters.
    pub fn sod_parameters(&self) -> &CurveParameters {
        self.state.sod()
    }

    /// Positions as loaded, before any valuation.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared snapshot cell.
    pub fn state(&self) -> &MarketState {
        &self.state
    }

    /// Streaming subscribers.
    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.subscribers
    }

    pub(crate) fn record_tick_success(&self) {
        self.health.record_success();
    }

    pub(crate) fn record_tick_failure(&self, error: &EngineError) {
        self.health.record_failure(error.to_string());
    }
}

/// Values `positions` against `current` relative to `sod`.
fn build_snapshot(
    sod: &CurveParameters,
    current: &CurveParameters,
    positions: &[Position],
) -> Result<PortfolioSnapshot, EngineError> {
    let curve = evaluate_curve(sod, current)?;
    let deltas = delta_map(&curve);
    let positions = compute_pnl(positions, &deltas);
    let total_pnl = aggregate_pnl(&positions);

    if !total_pnl.is_finite() {
        return Err(EngineError::CalculationError(format!(
            "non-finite portfolio P&L: {}",
            total_pnl
        )));
    }

    Ok(PortfolioSnapshot::new(*current, curve, positions, total_pnl))
}
