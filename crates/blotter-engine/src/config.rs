//! Engine configuration.

use std::time::Duration;

use blotter_core::CurveParameters;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Engine configuration.
///
/// Read from the `[engine]` table of the server configuration; every field
/// has a default so an empty table is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine name (used in logs)
    #[serde(default = "default_name")]
    pub name: String,

    /// Update period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Per-tick standard deviation of each curve shape factor
    #[serde(default = "default_volatility")]
    pub volatility: f64,

    /// Seed for the drift generator; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Snapshots buffered per streaming subscriber before it is dropped as lagging
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,

    /// Consecutive failed ticks before the engine reports degraded health
    #[serde(default = "default_degraded_after")]
    pub degraded_after: u32,

    /// Start-of-day curve parameters, used when no curve file can be fitted
    #[serde(default)]
    pub sod: CurveParameters,
}

fn default_name() -> String {
    "blotter".to_string()
}

fn default_tick_interval_ms() -> u64 {
    2_000
}

fn default_volatility() -> f64 {
    0.0002
}

fn default_subscriber_buffer() -> usize {
    64
}

fn default_degraded_after() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            tick_interval_ms: default_tick_interval_ms(),
            volatility: default_volatility(),
            seed: None,
            subscriber_buffer: default_subscriber_buffer(),
            degraded_after: default_degraded_after(),
            sod: CurveParameters::default(),
        }
    }
}

impl EngineConfig {
    /// Update period.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Checks values the engine cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.tick_interval_ms == 0 {
            return Err(EngineError::ConfigError(
                "tick_interval_ms must be positive".into(),
            ));
        }
        if self.subscriber_buffer == 0 {
            return Err(EngineError::ConfigError(
                "subscriber_buffer must be positive".into(),
            ));
        }
        if self.degraded_after == 0 {
            return Err(EngineError::ConfigError(
                "degraded_after must be at least 1".into(),
            ));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(EngineError::ConfigError(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        Ok(())
    }
}
