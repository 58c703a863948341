//! Domain types for the Blotter simulator.

mod curve;
mod position;
mod snapshot;
mod tenor;

pub use curve::{CurveParameters, CurvePoint, DeltaMap};
pub use position::{round_currency, PnlSummary, Position};
pub use snapshot::PortfolioSnapshot;
pub use tenor::Tenor;
