//! DV01-based P&L attribution.
//!
//! Each position's P&L is the sum over its tenor buckets of
//! `sensitivity × curve move in bp`. A bucket whose tenor has no entry in the
//! delta map contributes nothing. Derived figures are rounded to cents once,
//! here, and the portfolio total is the sum of the rounded figures.

use blotter_core::{round_currency, DeltaMap, PnlSummary, Position};

/// Unrounded P&L of one position for the given curve moves.
pub fn position_pnl(position: &Position, deltas: &DeltaMap) -> f64 {
    position
        .dv01_bucketed
        .iter()
        .map(|(tenor, dv01)| dv01 * deltas.get(tenor).copied().unwrap_or(0.0))
        .sum()
}

/// Returns copies of `positions` with `pnl` and `pv_live` recomputed.
///
/// Input order is preserved.
pub fn compute_pnl(positions: &[Position], deltas: &DeltaMap) -> Vec<Position> {
    positions
        .iter()
        .map(|position| {
            let raw = position_pnl(position, deltas);
            Position {
                pnl: round_currency(raw),
                pv_live: round_currency(position.pv_sod + raw),
                ..position.clone()
            }
        })
        .collect()
}

/// Portfolio P&L: the sum of each position's rounded P&L.
pub fn aggregate_pnl(positions: &[Position]) -> f64 {
    positions.iter().map(|p| p.pnl).sum()
}

/// Portfolio aggregates over already-computed positions.
pub fn summarize(positions: &[Position]) -> PnlSummary {
    PnlSummary::from_positions(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use blotter_core::Tenor;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn position(id: &str, buckets: &[(Tenor, f64)]) -> Position {
        Position::new(id, 1_000_000.0, 1_000_000.0, buckets.iter().copied().collect())
    }

    #[test]
    fn test_single_bucket_pnl() {
        let positions = vec![position("912828XG0", &[(Tenor::Y10, 1000.0)])];
        let deltas: DeltaMap = [(Tenor::Y10, 10.0)].into_iter().collect();

        let computed = compute_pnl(&positions, &deltas);
        assert_eq!(computed[0].pnl, 10_000.0);
        assert_eq!(computed[0].pv_live, 1_010_000.0);
        assert_eq!(aggregate_pnl(&computed), 10_000.0);
    }

    #[test]
    fn test_multiple_buckets_sum() {
        let positions = vec![position(
            "A",
            &[(Tenor::Y2, 200.0), (Tenor::Y5, -150.0), (Tenor::Y30, 50.0)],
        )];
        let deltas: DeltaMap = [(Tenor::Y2, 1.5), (Tenor::Y5, 2.0), (Tenor::Y30, -4.0)]
            .into_iter()
            .collect();

        let computed = compute_pnl(&positions, &deltas);
        assert_relative_eq!(computed[0].pnl, 300.0 - 300.0 - 200.0);
    }

    #[test]
    fn test_missing_tenor_contributes_zero() {
        let positions = vec![position("A", &[(Tenor::M3, 500.0), (Tenor::Y10, 100.0)])];
        let deltas: DeltaMap = [(Tenor::Y10, 1.0)].into_iter().collect();

        let computed = compute_pnl(&positions, &deltas);
        assert_eq!(computed[0].pnl, 100.0);
    }

    #[test]
    fn test_empty_delta_map_gives_zero() {
        let positions = vec![
            position("A", &[(Tenor::Y10, 1000.0)]),
            position("B", &[(Tenor::Y2, -300.0)]),
        ];
        let computed = compute_pnl(&positions, &DeltaMap::new());

        assert!(computed.iter().all(|p| p.pnl == 0.0));
        assert!(computed.iter().all(|p| p.pv_live == p.pv_sod));
        assert_eq!(aggregate_pnl(&computed), 0.0);
    }

    #[test]
    fn test_empty_portfolio() {
        let computed = compute_pnl(&[], &DeltaMap::new());
        assert!(computed.is_empty());
        assert_eq!(aggregate_pnl(&computed), 0.0);
        assert_eq!(summarize(&computed).position_count, 0);
    }

    #[test]
    fn test_rounding_and_total_of_rounded() {
        let positions = vec![
            position("A", &[(Tenor::Y1, 1.0)]),
            position("B", &[(Tenor::Y1, 1.0)]),
        ];
        let deltas: DeltaMap = [(Tenor::Y1, 0.004)].into_iter().collect();

        let computed = compute_pnl(&positions, &deltas);
        assert_eq!(computed[0].pnl, 0.0);
        assert_eq!(computed[1].pnl, 0.0);
        // 0.008 unrounded, but the total is the sum of the rounded figures
        assert_eq!(aggregate_pnl(&computed), 0.0);
    }

    #[test]
    fn test_order_and_ids_preserved() {
        let positions = vec![
            position("C", &[(Tenor::Y5, 1.0)]),
            position("A", &[(Tenor::Y5, 2.0)]),
            position("B", &[]),
        ];
        let deltas: DeltaMap = [(Tenor::Y5, 1.0)].into_iter().collect();

        let computed = compute_pnl(&positions, &deltas);
        let ids: Vec<_> = computed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
        assert_eq!(computed[2].pnl, 0.0);
    }

    proptest! {
        #[test]
        fn prop_total_independent_of_order(
            sens in prop::collection::vec(-10_000.0f64..10_000.0, 1..20),
            delta in -50.0f64..50.0,
        ) {
            let positions: Vec<Position> = sens
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    let mut buckets = BTreeMap::new();
                    buckets.insert(Tenor::Y10, *s);
                    Position::new(format!("P{i}"), 1.0, 0.0, buckets)
                })
                .collect();
            let deltas: DeltaMap = [(Tenor::Y10, delta)].into_iter().collect();

            let forward = aggregate_pnl(&compute_pnl(&positions, &deltas));
            let mut reversed = positions.clone();
            reversed.reverse();
            let backward = aggregate_pnl(&compute_pnl(&reversed, &deltas));

            prop_assert!((forward - backward).abs() < 1e-6);
        }

        #[test]
        fn prop_zero_deltas_zero_pnl(sens in prop::collection::vec(-1e6f64..1e6, 0..10)) {
            let positions: Vec<Position> = sens
                .iter()
                .map(|s| position("X", &[(Tenor::Y2, *s), (Tenor::Y30, -*s)]))
                .collect();
            let deltas: DeltaMap = Tenor::ALL.iter().map(|t| (*t, 0.0)).collect();
            prop_assert_eq!(aggregate_pnl(&compute_pnl(&positions, &deltas)), 0.0);
        }
    }
}
