//! Engine error types.

use blotter_curves::CurveError;
use thiserror::Error;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Curve evaluation or drift error
    #[error("curve error: {0}")]
    Curve(#[from] CurveError),

    /// Calculation produced an unusable result
    #[error("calculation error: {0}")]
    CalculationError(String),

    /// A tick panicked and was contained at the tick boundary
    #[error("tick panicked: {0}")]
    TickPanicked(String),
}
