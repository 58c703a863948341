//! Builder pattern for the market engine.

use blotter_core::{CurveParameters, Position};

use crate::config::EngineConfig;
use crate::engine::MarketEngine;
use crate::error::EngineError;

/// Builder for constructing a [`MarketEngine`].
#[derive(Debug, Default)]
pub struct MarketEngineBuilder {
    config: Option<EngineConfig>,
    sod: Option<CurveParameters>,
    positions: Vec<Position>,
    seed: Option<u64>,
}

impl MarketEngineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the start-of-day curve parameters. Defaults to `config.sod`.
    pub fn with_sod_parameters(mut self, sod: CurveParameters) -> Self {
        self.sod = Some(sod);
        self
    }

    /// Set the portfolio.
    pub fn with_positions(mut self, positions: Vec<Position>) -> Self {
        self.positions = positions;
        self
    }

    /// Seed the drift generator, overriding any seed in the configuration.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the market engine.
    pub fn build(self) -> Result<MarketEngine, EngineError> {
        let mut config = self.config.unwrap_or_default();
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        let sod = self.sod.unwrap_or(config.sod);

        MarketEngine::new(config, sod, self.positions)
    }
}
