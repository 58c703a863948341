//! Nelson-Siegel curve model.
//!
//! The model parameterizes the yield curve as:
//! ```text
//! y(t) = β₀ + β₁ * ((1 - e^(-t/τ)) / (t/τ))
//!           + β₂ * ((1 - e^(-t/τ)) / (t/τ) - e^(-t/τ))
//! ```
//!
//! Where:
//! - β₀ (`level`): long-term level, the asymptotic yield
//! - β₁ (`slope`): short-term component, β₀ + β₁ is the instantaneous short rate
//! - β₂ (`curvature`): medium-term hump (β₂ > 0) or trough (β₂ < 0)
//! - τ (`decay`): controls where the hump peaks

use blotter_core::{CurveParameters, CurvePoint, DeltaMap, Tenor};
use nalgebra::{Matrix3, Vector3};

use crate::error::{CurveError, CurveResult};

/// Below this `t/τ` the loading factors switch to their Taylor expansions.
const SMALL_X: f64 = 1e-10;

/// (1 - e^(-x)) / x, with f1(0) = 1.
fn loading_factor_1(x: f64) -> f64 {
    if x.abs() < SMALL_X {
        1.0 - x / 2.0 + x * x / 6.0
    } else {
        -(-x).exp_m1() / x
    }
}

/// (1 - e^(-x)) / x - e^(-x), with f2(0) = 0.
fn loading_factor_2(x: f64) -> f64 {
    if x.abs() < SMALL_X {
        x / 2.0 - x * x / 3.0
    } else {
        loading_factor_1(x) - (-x).exp()
    }
}

fn check_decay(decay: f64) -> CurveResult<()> {
    if decay.is_finite() && decay > 0.0 {
        Ok(())
    } else {
        Err(CurveError::InvalidDecay { decay })
    }
}

fn check_tenor(tenor_years: f64) -> CurveResult<()> {
    if tenor_years.is_finite() && tenor_years > 0.0 {
        Ok(())
    } else {
        Err(CurveError::InvalidTenor { tenor_years })
    }
}

/// Returns the model yield at `tenor_years`.
///
/// # Errors
///
/// `InvalidTenor` for a non-positive tenor, `InvalidDecay` for a non-positive
/// decay, `NonFiniteYield` if the parameters themselves are not finite.
///
/// # Example
///
/// ```rust
/// use blotter_core::CurveParameters;
/// use blotter_curves::yield_at;
///
/// let params = CurveParameters::new(0.045, -0.02, 0.01, 2.0);
/// let short_rate = yield_at(&params, 0.25).unwrap();
/// let long_rate = yield_at(&params, 30.0).unwrap();
/// assert!(short_rate < long_rate);
/// ```
pub fn yield_at(params: &CurveParameters, tenor_years: f64) -> CurveResult<f64> {
    check_tenor(tenor_years)?;
    check_decay(params.decay)?;

    let x = tenor_years / params.decay;
    let y = params.level
        + params.slope * loading_factor_1(x)
        + params.curvature * loading_factor_2(x);

    if y.is_finite() {
        Ok(y)
    } else {
        Err(CurveError::NonFiniteYield { tenor_years })
    }
}

/// Evaluates both curves at every tenor and returns the points in tenor order.
pub fn evaluate_curve(
    sod: &CurveParameters,
    current: &CurveParameters,
) -> CurveResult<Vec<CurvePoint>> {
    Tenor::ALL
        .iter()
        .map(|&tenor| {
            let sod_yield = yield_at(sod, tenor.years())?;
            let live_yield = yield_at(current, tenor.years())?;
            Ok(CurvePoint::new(tenor, sod_yield, live_yield))
        })
        .collect()
}

/// Basis point deltas keyed by tenor.
#[must_use]
pub fn delta_map(curve: &[CurvePoint]) -> DeltaMap {
    curve.iter().map(|p| (p.tenor, p.delta_bp)).collect()
}

/// Fits level, slope and curvature to observed `(tenor_years, yield)` pairs
/// by ordinary least squares, holding `decay` fixed.
///
/// With the decay fixed the model is linear in the three betas, so the fit is
/// a single solve of the 3x3 normal equations.
///
/// # Errors
///
/// `InsufficientData` for fewer than three points, `SingularFit` if the
/// tenors do not identify all three factors.
pub fn fit_parameters(points: &[(f64, f64)], decay: f64) -> CurveResult<CurveParameters> {
    check_decay(decay)?;
    if points.len() < 3 {
        return Err(CurveError::InsufficientData {
            required: 3,
            actual: points.len(),
        });
    }

    let mut tenors: Vec<f64> = points.iter().map(|&(t, _)| t).collect();
    tenors.sort_by(f64::total_cmp);
    tenors.dedup();
    if tenors.len() < 3 {
        return Err(CurveError::SingularFit);
    }

    let mut xtx = Matrix3::<f64>::zeros();
    let mut xty = Vector3::<f64>::zeros();

    for &(t, y) in points {
        check_tenor(t)?;
        let x = t / decay;
        let row = Vector3::new(1.0, loading_factor_1(x), loading_factor_2(x));
        xtx += row * row.transpose();
        xty += row * y;
    }

    let inverse = xtx.try_inverse().ok_or(CurveError::SingularFit)?;
    let beta = inverse * xty;

    if beta.iter().all(|b| b.is_finite()) {
        Ok(CurveParameters::new(beta[0], beta[1], beta[2], decay))
    } else {
        Err(CurveError::SingularFit)
    }
}
