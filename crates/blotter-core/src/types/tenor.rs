//! The fixed tenor table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A named maturity bucket on the yield curve.
///
/// The set is closed: every component that consumes tenors uses this table,
/// so the curve model and the P&L engine always agree on year fractions.
/// Variants are declared in maturity order, which is also their `Ord` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tenor {
    /// 3 months
    #[serde(rename = "3M")]
    M3,
    /// 6 months
    #[serde(rename = "6M")]
    M6,
    /// 1 year
    #[serde(rename = "1Y")]
    Y1,
    /// 2 years
    #[serde(rename = "2Y")]
    Y2,
    /// 5 years
    #[serde(rename = "5Y")]
    Y5,
    /// 10 years
    #[serde(rename = "10Y")]
    Y10,
    /// 30 years
    #[serde(rename = "30Y")]
    Y30,
}

impl Tenor {
    /// All tenors in maturity order.
    pub const ALL: [Tenor; 7] = [
        Tenor::M3,
        Tenor::M6,
        Tenor::Y1,
        Tenor::Y2,
        Tenor::Y5,
        Tenor::Y10,
        Tenor::Y30,
    ];

    /// Returns the year fraction for this tenor.
    #[must_use]
    pub fn years(&self) -> f64 {
        match self {
            Tenor::M3 => 0.25,
            Tenor::M6 => 0.5,
            Tenor::Y1 => 1.0,
            Tenor::Y2 => 2.0,
            Tenor::Y5 => 5.0,
            Tenor::Y10 => 10.0,
            Tenor::Y30 => 30.0,
        }
    }

    /// Returns the market label (e.g. `"10Y"`).
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Tenor::M3 => "3M",
            Tenor::M6 => "6M",
            Tenor::Y1 => "1Y",
            Tenor::Y2 => "2Y",
            Tenor::Y5 => "5Y",
            Tenor::Y10 => "10Y",
            Tenor::Y30 => "30Y",
        }
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tenor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Tenor::ALL
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(label))
            .ok_or_else(|| CoreError::unknown_tenor(label))
    }
}
