//! # Blotter Core
//!
//! Core types shared by every Blotter crate.
//!
//! - **Tenors**: the closed, ordered set of curve maturities and their year fractions
//! - **Curve types**: Nelson-Siegel parameters and per-tenor curve points
//! - **Positions**: DV01-bucketed positions and portfolio summaries
//! - **Snapshots**: the immutable unit of publication consumed by readers and subscribers
//!
//! ## Example
//!
//! ```rust
//! use blotter_core::prelude::*;
//!
//! assert_eq!(Tenor::Y10.years(), 10.0);
//! assert_eq!("30Y".parse::<Tenor>().unwrap(), Tenor::Y30);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::{
        round_currency, CurveParameters, CurvePoint, DeltaMap, PnlSummary, PortfolioSnapshot,
        Position, Tenor,
    };
}

pub use error::{CoreError, CoreResult};
pub use types::*;
