//! Start-of-day curve loading and fitting.
//!
//! The curve file has two columns, `tenor` and `yield` (decimal, e.g.
//! `0.0450` for 4.50%).

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use blotter_core::{CurveParameters, Tenor};
use blotter_curves::{fit_parameters, yield_at};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use tracing::{error, info, warn};

use crate::error::LoadError;

/// Plausible range for a loaded yield; values outside are kept but flagged.
const YIELD_SANITY_RANGE: (f64, f64) = (0.0, 0.20);

/// Loads a start-of-day curve keyed by tenor.
///
/// Returns an empty map, after logging why, when the file is missing,
/// unreadable, lacks a column or has no valid rows.
pub fn load_curve(path: impl AsRef<Path>) -> BTreeMap<Tenor, f64> {
    let path = path.as_ref();
    match read_curve(path) {
        Ok(curve) => {
            let min = curve.values().copied().fold(f64::INFINITY, f64::min);
            let max = curve.values().copied().fold(f64::NEG_INFINITY, f64::max);
            info!(
                "Loaded curve with {} tenors from {}: yields {:.2}% to {:.2}%",
                curve.len(),
                path.display(),
                min * 100.0,
                max * 100.0
            );
            curve
        }
        Err(e) => {
            error!("Failed to load curve from {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

fn read_curve(path: &Path) -> Result<BTreeMap<Tenor, f64>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.display().to_string()));
    }

    let mut reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
    let headers = reader.headers()?.clone();
    let tenor_idx = headers.iter().position(|h| h == "tenor");
    let yield_idx = headers.iter().position(|h| h == "yield");
    let (Some(tenor_idx), Some(yield_idx)) = (tenor_idx, yield_idx) else {
        let missing = ["tenor", "yield"]
            .iter()
            .filter(|&&c| !headers.iter().any(|h| h == c))
            .map(|c| c.to_string())
            .collect();
        return Err(LoadError::MissingColumns(missing));
    };

    let mut curve = BTreeMap::new();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping curve row {}: {}", row + 1, e);
                continue;
            }
        };

        let label = record.get(tenor_idx).unwrap_or_default();
        let Ok(tenor) = Tenor::from_str(label) else {
            warn!("Skipping curve row {}: unknown tenor '{}'", row + 1, label);
            continue;
        };
        let raw = record.get(yield_idx).unwrap_or_default();
        let value = match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                warn!("Skipping curve row {}: invalid yield '{}'", row + 1, raw);
                continue;
            }
        };

        if !(YIELD_SANITY_RANGE.0..=YIELD_SANITY_RANGE.1).contains(&value) {
            warn!("Unusual yield for {}: {:.2}%", tenor, value * 100.0);
        }
        curve.insert(tenor, value);
    }

    if curve.is_empty() {
        return Err(LoadError::Empty(path.display().to_string()));
    }
    Ok(curve)
}

/// Derives start-of-day model parameters from a loaded curve.
///
/// Level, slope and curvature are fitted with the decay of `fallback` held
/// fixed. Returns `fallback` when the curve is empty or cannot be fitted.
pub fn sod_parameters(curve: &BTreeMap<Tenor, f64>, fallback: CurveParameters) -> CurveParameters {
    if curve.is_empty() {
        info!("No start-of-day curve loaded, using configured parameters");
        return fallback;
    }

    let points: Vec<(f64, f64)> = curve.iter().map(|(t, y)| (t.years(), *y)).collect();
    match fit_parameters(&points, fallback.decay) {
        Ok(params) => {
            info!(
                "Fitted start-of-day curve to {} points: level={:.4}, slope={:.4}, curvature={:.4}",
                points.len(),
                params.level,
                params.slope,
                params.curvature
            );
            params
        }
        Err(e) => {
            warn!("Could not fit start-of-day curve ({}), using configured parameters", e);
            fallback
        }
    }
}

/// Writes the curve implied by `params` at every tenor.
///
/// The output is readable by [`load_curve`].
pub fn write_curve(path: impl AsRef<Path>, params: &CurveParameters) -> Result<(), LoadError> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(["tenor", "yield"])?;

    for tenor in Tenor::ALL {
        let value = yield_at(params, tenor.years())?;
        writer.write_record([tenor.label(), value.to_string().as_str()])?;
    }
    writer.flush()?;

    info!("Wrote start-of-day curve to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_curve() {
        let file = csv_file("tenor,yield\n3M,0.0450\n1Y,0.0490\n10Y,0.0580\n");

        let curve = load_curve(file.path());
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.get(&Tenor::M3), Some(&0.0450));
        assert_eq!(curve.get(&Tenor::Y10), Some(&0.0580));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_curve(dir.path().join("missing.csv")).is_empty());
    }

    #[test]
    fn test_wrong_columns_is_empty() {
        let file = csv_file("maturity,rate\n3M,0.04\n");
        assert!(load_curve(file.path()).is_empty());
    }

    #[test]
    fn test_bad_rows_skipped() {
        let file = csv_file("tenor,yield\n3M,0.045\n7Y,0.05\n5Y,n/a\n30Y,0.061\n");

        let curve = load_curve(file.path());
        assert_eq!(curve.keys().copied().collect::<Vec<_>>(), vec![Tenor::M3, Tenor::Y30]);
    }

    #[test]
    fn test_unusual_yield_kept() {
        let file = csv_file("tenor,yield\n2Y,0.35\n5Y,-0.002\n");

        let curve = load_curve(file.path());
        assert_eq!(curve.get(&Tenor::Y2), Some(&0.35));
        assert_eq!(curve.get(&Tenor::Y5), Some(&-0.002));
    }

    #[test]
    fn test_header_only_is_empty() {
        let file = csv_file("tenor,yield\n");
        assert!(load_curve(file.path()).is_empty());
    }

    #[test]
    fn test_write_then_fit_recovers_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sod_curve.csv");
        let params = CurveParameters::default();

        write_curve(&path, &params).unwrap();
        let curve = load_curve(&path);
        assert_eq!(curve.len(), Tenor::ALL.len());

        let fitted = sod_parameters(&curve, CurveParameters::new(0.0, 0.0, 0.0, params.decay));
        assert_relative_eq!(fitted.level, params.level, epsilon = 1e-9);
        assert_relative_eq!(fitted.slope, params.slope, epsilon = 1e-9);
        assert_relative_eq!(fitted.curvature, params.curvature, epsilon = 1e-9);
        assert_eq!(fitted.decay, params.decay);
    }

    #[test]
    fn test_sod_parameters_falls_back() {
        let fallback = CurveParameters::default();
        assert_eq!(sod_parameters(&BTreeMap::new(), fallback), fallback);

        let mut two_points = BTreeMap::new();
        two_points.insert(Tenor::Y1, 0.05);
        two_points.insert(Tenor::Y10, 0.06);
        assert_eq!(sod_parameters(&two_points, fallback), fallback);
    }
}
