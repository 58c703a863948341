//! Shared market state.
//!
//! The current snapshot lives behind an `Arc` so readers clone a pointer and
//! never observe a partially written snapshot. The lock is held only for the
//! pointer swap.

use std::sync::Arc;

use blotter_core::{CurveParameters, PortfolioSnapshot};
use parking_lot::RwLock;

/// The single authoritative view of the live market and portfolio.
#[derive(Debug)]
pub struct MarketState {
    sod: CurveParameters,
    current: RwLock<Arc<PortfolioSnapshot>>,
}

impl MarketState {
    /// Creates the state and publishes `initial` as sequence 1.
    pub fn new(sod: CurveParameters, mut initial: PortfolioSnapshot) -> Self {
        initial.sequence = 1;
        Self {
            sod,
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Start-of-day parameters. Fixed for the life of the state.
    pub fn sod(&self) -> &CurveParameters {
        &self.sod
    }

    /// Latest published snapshot.
    pub fn read(&self) -> Arc<PortfolioSnapshot> {
        self.current.read().clone()
    }

    /// Sequence number of the latest published snapshot.
    pub fn sequence(&self) -> u64 {
        self.current.read().sequence
    }

    /// Replaces the current snapshot.
    ///
    /// Stamps the next sequence number; any `sequence` already set on
    /// `snapshot` is overwritten.
    pub fn publish(&self, mut snapshot: PortfolioSnapshot) -> Arc<PortfolioSnapshot> {
        let mut current = self.current.write();
        snapshot.sequence = current.sequence + 1;
        let published = Arc::new(snapshot);
        *current = Arc::clone(&published);
        published
    }
}
