//! Loader errors.
//!
//! The loaders log these and return empty collections; only
//! [`write_curve`](crate::write_curve) hands them to the caller.

use blotter_curves::CurveError;
use thiserror::Error;

/// Why a reference data file could not be read or written.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file does not exist
    #[error("file not found: {0}")]
    NotFound(String),

    /// CSV parse or write failure
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure outside the CSV layer
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Curve parameters could not be evaluated
    #[error("curve error: {0}")]
    Curve(#[from] CurveError),

    /// Required header columns are absent
    #[error("missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    /// The file has a header but no usable rows
    #[error("no valid rows in {0}")]
    Empty(String),
}
