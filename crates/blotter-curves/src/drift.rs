//! Stochastic drift of curve parameters.
//!
//! Each tick the three shape factors (level, slope, curvature) receive
//! independent draws from `Normal(0, volatility)`. The decay is never
//! perturbed. [`DriftProcess`] owns the only random number generator in the
//! system, so seeding it makes a whole simulation reproducible.

use blotter_core::CurveParameters;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{debug, info};

use crate::error::{CurveError, CurveResult};

fn check_volatility(volatility: f64) -> CurveResult<()> {
    if volatility.is_finite() && volatility >= 0.0 {
        Ok(())
    } else {
        Err(CurveError::InvalidVolatility { volatility })
    }
}

/// Returns `params` with a random perturbation applied to the shape factors.
///
/// A volatility of zero returns the parameters unchanged without consuming
/// any randomness.
pub fn apply_drift<R: Rng + ?Sized>(
    params: &CurveParameters,
    volatility: f64,
    rng: &mut R,
) -> CurveResult<CurveParameters> {
    check_volatility(volatility)?;
    if volatility == 0.0 {
        return Ok(*params);
    }

    let normal =
        Normal::new(0.0, volatility).map_err(|_| CurveError::InvalidVolatility { volatility })?;

    Ok(params.with_shape(
        params.level + normal.sample(rng),
        params.slope + normal.sample(rng),
        params.curvature + normal.sample(rng),
    ))
}

/// Start-of-day and current curve parameters plus the drift generator.
#[derive(Debug)]
pub struct DriftProcess {
    /// Start-of-day parameters, fixed for the life of the process
    sod: CurveParameters,
    /// Parameters after the last committed tick
    current: CurveParameters,
    /// Per-tick standard deviation of each shape factor
    volatility: f64,
    rng: StdRng,
    seed: Option<u64>,
}

impl DriftProcess {
    /// Creates a process seeded from system entropy.
    pub fn new(sod: CurveParameters, volatility: f64) -> CurveResult<Self> {
        Self::build(sod, volatility, None)
    }

    /// Creates a reproducible process.
    pub fn with_seed(sod: CurveParameters, volatility: f64, seed: u64) -> CurveResult<Self> {
        Self::build(sod, volatility, Some(seed))
    }

    /// Creates a process, seeded when `seed` is given.
    pub fn build(sod: CurveParameters, volatility: f64, seed: Option<u64>) -> CurveResult<Self> {
        check_volatility(volatility)?;
        if !(sod.decay.is_finite() && sod.decay > 0.0) {
            return Err(CurveError::InvalidDecay { decay: sod.decay });
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "Drift process initialized: level={:.4}, slope={:.4}, curvature={:.4}, decay={:.4}, vol={}",
            sod.level, sod.slope, sod.curvature, sod.decay, volatility
        );

        Ok(Self {
            sod,
            current: sod,
            volatility,
            rng,
            seed,
        })
    }

    /// Start-of-day parameters.
    pub fn sod(&self) -> &CurveParameters {
        &self.sod
    }

    /// Current parameters.
    pub fn current(&self) -> &CurveParameters {
        &self.current
    }

    /// Per-tick volatility.
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Seed, if the process was seeded explicitly.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Draws the next parameters without making them current.
    pub fn propose(&mut self) -> CurveResult<CurveParameters> {
        apply_drift(&self.current, self.volatility, &mut self.rng)
    }

    /// Makes `params` the current parameters.
    pub fn commit(&mut self, params: CurveParameters) {
        debug_assert_eq!(params.decay, self.sod.decay);
        self.current = params;
        debug!(
            "Applied drift: level={:.6}, slope={:.6}, curvature={:.6}",
            params.level, params.slope, params.curvature
        );
    }

    /// Draws and commits the next parameters.
    pub fn step(&mut self) -> CurveResult<CurveParameters> {
        let next = self.propose()?;
        self.commit(next);
        Ok(next)
    }

    /// Restores the start-of-day parameters.
    pub fn reset_to_sod(&mut self) {
        self.current = self.sod;
        info!("Curve reset to SOD parameters");
    }
}
