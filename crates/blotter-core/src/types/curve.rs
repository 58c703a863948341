//! Curve parameter and curve point types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Tenor;

/// Curve move per tenor in basis points.
pub type DeltaMap = BTreeMap<Tenor, f64>;

/// Nelson-Siegel curve parameters.
///
/// ```text
/// y(t) = level + slope * f1(t / decay) + curvature * f2(t / decay)
/// ```
///
/// Yields are decimals (0.05 = 5%). `decay` is in years and is never
/// perturbed by the drift process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParameters {
    /// Long-term level (β₀)
    pub level: f64,
    /// Short-term component (β₁)
    pub slope: f64,
    /// Medium-term hump (β₂)
    pub curvature: f64,
    /// Decay factor τ in years
    pub decay: f64,
}

impl CurveParameters {
    /// Creates a new parameter set.
    #[must_use]
    pub fn new(level: f64, slope: f64, curvature: f64, decay: f64) -> Self {
        Self {
            level,
            slope,
            curvature,
            decay,
        }
    }

    /// Returns a copy with new shape factors and the same decay.
    #[must_use]
    pub fn with_shape(&self, level: f64, slope: f64, curvature: f64) -> Self {
        Self {
            level,
            slope,
            curvature,
            decay: self.decay,
        }
    }
}

impl Default for CurveParameters {
    /// The desk's start-of-day curve: 5.5% long end, mild inversion at the
    /// short end, a small hump, decay of 1/0.6 years.
    fn default() -> Self {
        Self::new(0.055, -0.015, 0.008, 1.0 / 0.6)
    }
}

/// A single point on the yield curve, compared against start of day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Tenor bucket
    pub tenor: Tenor,
    /// Start-of-day yield
    pub sod_yield: f64,
    /// Current live yield
    pub live_yield: f64,
    /// Change from start of day in basis points
    pub delta_bp: f64,
}

impl CurvePoint {
    /// Creates a curve point, deriving the basis point delta.
    #[must_use]
    pub fn new(tenor: Tenor, sod_yield: f64, live_yield: f64) -> Self {
        Self {
            tenor,
            sod_yield,
            live_yield,
            delta_bp: (live_yield - sod_yield) * 10_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_delta_in_basis_points() {
        let point = CurvePoint::new(Tenor::Y10, 0.0580, 0.0585);
        assert_relative_eq!(point.delta_bp, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unchanged_yield_has_zero_delta() {
        let point = CurvePoint::new(Tenor::M3, 0.0412, 0.0412);
        assert_eq!(point.delta_bp, 0.0);
    }

    #[test]
    fn test_with_shape_keeps_decay() {
        let params = CurveParameters::default();
        let moved = params.with_shape(0.06, -0.01, 0.0);
        assert_eq!(moved.decay, params.decay);
        assert_eq!(moved.level, 0.06);
    }
}
