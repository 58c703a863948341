//! # Blotter Curves
//!
//! The curve side of the Blotter simulator:
//!
//! - [`yield_at`]: Nelson-Siegel yield for a parameter set and tenor
//! - [`evaluate_curve`]: start-of-day vs live yields for the whole tenor table
//! - [`fit_parameters`]: least-squares fit of SOD parameters from observed yields
//! - [`DriftProcess`]: seeded random walk of the curve's shape factors
//!
//! ## Example
//!
//! ```rust
//! use blotter_core::CurveParameters;
//! use blotter_curves::{evaluate_curve, DriftProcess};
//!
//! let sod = CurveParameters::default();
//! let mut drift = DriftProcess::with_seed(sod, 0.0002, 42).unwrap();
//! let live = drift.step().unwrap();
//!
//! let curve = evaluate_curve(&sod, &live).unwrap();
//! assert_eq!(curve.len(), 7);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod drift;
pub mod error;
pub mod nelson_siegel;

pub use drift::{apply_drift, DriftProcess};
pub use error::{CurveError, CurveResult};
pub use nelson_siegel::{delta_map, evaluate_curve, fit_parameters, yield_at};
