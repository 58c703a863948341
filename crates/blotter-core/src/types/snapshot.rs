//! Published portfolio snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CurveParameters, CurvePoint, DeltaMap, PnlSummary, Position};

/// A complete, internally consistent view of curve, positions and P&L.
///
/// Snapshots are immutable once published and are shared behind an `Arc`.
/// `sequence` and `as_of` form the publication stamp: `sequence` is assigned
/// by the market state on publish and strictly increases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Publication sequence number
    pub sequence: u64,
    /// Time the snapshot was computed
    pub as_of: DateTime<Utc>,
    /// Curve parameters the live yields were computed from
    pub parameters: CurveParameters,
    /// Curve points in tenor order
    pub curve: Vec<CurvePoint>,
    /// Positions with live PV and P&L
    pub positions: Vec<Position>,
    /// Sum of position P&L
    pub total_pnl: f64,
}

impl PortfolioSnapshot {
    /// Creates an unpublished snapshot stamped with the current time.
    #[must_use]
    pub fn new(
        parameters: CurveParameters,
        curve: Vec<CurvePoint>,
        positions: Vec<Position>,
        total_pnl: f64,
    ) -> Self {
        Self {
            sequence: 0,
            as_of: Utc::now(),
            parameters,
            curve,
            positions,
            total_pnl,
        }
    }

    /// Curve deltas keyed by tenor.
    #[must_use]
    pub fn delta_map(&self) -> DeltaMap {
        self.curve.iter().map(|p| (p.tenor, p.delta_bp)).collect()
    }

    /// Largest absolute curve move in basis points.
    #[must_use]
    pub fn max_abs_delta_bp(&self) -> f64 {
        self.curve
            .iter()
            .map(|p| p.delta_bp.abs())
            .fold(0.0, f64::max)
    }

    /// Portfolio aggregates for this snapshot.
    #[must_use]
    pub fn summary(&self) -> PnlSummary {
        PnlSummary::from_positions(&self.positions)
    }

    /// True when both snapshots describe the same market, ignoring the
    /// publication stamp.
    #[must_use]
    pub fn same_market_as(&self, other: &Self) -> bool {
        self.parameters == other.parameters
            && self.curve == other.curve
            && self.positions == other.positions
            && self.total_pnl == other.total_pnl
    }
}
