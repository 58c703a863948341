//! Error types for core Blotter types.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while constructing core types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A tenor label outside the fixed tenor table.
    #[error("Unknown tenor: {label}")]
    UnknownTenor {
        /// The label that failed to parse.
        label: String,
    },
}

impl CoreError {
    /// Creates an unknown tenor error.
    #[must_use]
    pub fn unknown_tenor(label: impl Into<String>) -> Self {
        Self::UnknownTenor {
            label: label.into(),
        }
    }
}
