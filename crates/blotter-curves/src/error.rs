//! Error types for curve evaluation, fitting and drift.

use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Errors that can occur while evaluating or evolving a curve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// Tenor must be a positive, finite year fraction.
    #[error("Invalid tenor: {tenor_years} years (must be positive)")]
    InvalidTenor {
        /// The offending year fraction.
        tenor_years: f64,
    },

    /// Decay factor must be positive and finite.
    #[error("Invalid decay: {decay} (must be positive)")]
    InvalidDecay {
        /// The offending decay.
        decay: f64,
    },

    /// Drift volatility must be non-negative and finite.
    #[error("Invalid volatility: {volatility} (must be non-negative)")]
    InvalidVolatility {
        /// The offending volatility.
        volatility: f64,
    },

    /// The model produced a non-finite yield.
    #[error("Non-finite yield at {tenor_years} years")]
    NonFiniteYield {
        /// Year fraction that produced the value.
        tenor_years: f64,
    },

    /// Not enough points to fit the model.
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData {
        /// Minimum required points.
        required: usize,
        /// Points supplied.
        actual: usize,
    },

    /// The least-squares normal matrix could not be inverted.
    #[error("Singular fit: curve points do not identify the model")]
    SingularFit,
}
