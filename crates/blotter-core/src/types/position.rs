//! Position and P&L summary types.

use std::collections::BTreeMap;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::Tenor;

/// Rounds a currency amount to cents.
///
/// Rounding goes through `Decimal` so that values like `1.005` round on their
/// decimal representation. Negative zero is normalised to `0.0`. Values that
/// cannot be represented as a `Decimal` (non-finite or out of range) are
/// returned unchanged.
#[must_use]
pub fn round_currency(value: f64) -> f64 {
    let rounded = Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value);

    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// A bond position with bucketed DV01 sensitivities.
///
/// `id`, `notional`, `pv_sod` and `dv01_bucketed` are reference data fixed at
/// load time. `pv_live` and `pnl` are derived and differ between snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument identifier (CUSIP)
    #[serde(alias = "cusip")]
    pub id: String,
    /// Notional amount
    pub notional: f64,
    /// Start-of-day present value
    pub pv_sod: f64,
    /// Dollar change per basis point, by tenor bucket
    #[serde(default)]
    pub dv01_bucketed: BTreeMap<Tenor, f64>,
    /// Current live present value
    #[serde(default)]
    pub pv_live: f64,
    /// Profit and loss against start of day
    #[serde(default)]
    pub pnl: f64,
}

impl Position {
    /// Creates a position at start of day (zero P&L, live PV equal to SOD PV).
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        notional: f64,
        pv_sod: f64,
        dv01_bucketed: BTreeMap<Tenor, f64>,
    ) -> Self {
        Self {
            id: id.into(),
            notional,
            pv_sod,
            dv01_bucketed,
            pv_live: pv_sod,
            pnl: 0.0,
        }
    }
}

/// Portfolio-level P&L aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PnlSummary {
    /// Sum of position P&L
    pub total_pnl: f64,
    /// Sum of start-of-day PV
    pub total_pv_sod: f64,
    /// Sum of live PV
    pub total_pv_live: f64,
    /// Sum of notionals
    pub total_notional: f64,
    /// Number of positions
    pub position_count: usize,
}

impl PnlSummary {
    /// Aggregates a set of positions. An empty set gives all zeros.
    #[must_use]
    pub fn from_positions(positions: &[Position]) -> Self {
        positions.iter().fold(Self::default(), |acc, p| Self {
            total_pnl: acc.total_pnl + p.pnl,
            total_pv_sod: acc.total_pv_sod + p.pv_sod,
            total_pv_live: acc.total_pv_live + p.pv_live,
            total_notional: acc.total_notional + p.notional,
            position_count: acc.position_count + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(10_000.004), 10_000.0);
        assert_eq!(round_currency(1.005), 1.01);
        assert_eq!(round_currency(-1234.5678), -1234.57);
    }

    #[test]
    fn test_round_currency_normalises_negative_zero() {
        let rounded = round_currency(-0.001);
        assert_eq!(rounded, 0.0);
        assert!(rounded.is_sign_positive());
    }

    #[test]
    fn test_round_currency_passes_through_non_finite() {
        assert!(round_currency(f64::NAN).is_nan());
        assert_eq!(round_currency(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_new_position_is_flat() {
        let pos = Position::new("912828A123", 10_000_000.0, 9_985_000.0, BTreeMap::new());
        assert_eq!(pos.pnl, 0.0);
        assert_eq!(pos.pv_live, pos.pv_sod);
    }

    #[test]
    fn test_position_accepts_cusip_alias() {
        let json = r#"{"cusip":"912828A123","notional":1e7,"pv_sod":9985000,"dv01_bucketed":{"10Y":1000.0}}"#;
        let pos: Position = serde_json::from_str(json).unwrap();
        assert_eq!(pos.id, "912828A123");
        assert_eq!(pos.dv01_bucketed.get(&Tenor::Y10), Some(&1000.0));
    }

    #[test]
    fn test_summary_of_empty_portfolio() {
        assert_eq!(PnlSummary::from_positions(&[]), PnlSummary::default());
    }

    #[test]
    fn test_summary_totals() {
        let mut a = Position::new("A", 1_000_000.0, 990_000.0, BTreeMap::new());
        a.pnl = 150.0;
        a.pv_live = 990_150.0;
        let mut b = Position::new("B", 2_000_000.0, 2_010_000.0, BTreeMap::new());
        b.pnl = -50.0;
        b.pv_live = 2_009_950.0;

        let summary = PnlSummary::from_positions(&[a, b]);
        assert_eq!(summary.position_count, 2);
        assert_eq!(summary.total_pnl, 100.0);
        assert_eq!(summary.total_notional, 3_000_000.0);
        assert_eq!(summary.total_pv_live, 3_000_100.0);
    }
}
