//! # Blotter Ext File
//!
//! File-based reference data for Blotter.
//!
//! - CSV positions with bucketed DV01 columns
//! - CSV start-of-day yield curve, fitted to model parameters
//!
//! Loaders never fail: a missing or malformed file is logged and yields an
//! empty collection, which the engine treats as a valid (all-zero) input.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod curve;
mod error;
mod positions;

pub use curve::*;
pub use error::LoadError;
pub use positions::*;
