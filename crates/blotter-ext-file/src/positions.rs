//! Position loading.
//!
//! Expected columns: `cusip`, `notional`, `pv_sod` and one `dv01_<tenor>`
//! column per sensitivity bucket (e.g. `dv01_3M`, `dv01_10Y`).

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use blotter_core::{Position, Tenor};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{error, info, warn};

use crate::error::LoadError;

const REQUIRED_COLUMNS: [&str; 3] = ["cusip", "notional", "pv_sod"];
const DV01_PREFIX: &str = "dv01_";

/// Loads positions from a CSV file.
///
/// Returns an empty list, after logging why, when the file is missing,
/// unreadable or lacks a required column. Rows that fail to parse are
/// skipped individually.
pub fn load_positions(path: impl AsRef<Path>) -> Vec<Position> {
    let path = path.as_ref();
    match read_positions(path) {
        Ok(positions) => {
            let total_notional: f64 = positions.iter().map(|p| p.notional).sum();
            let total_pv: f64 = positions.iter().map(|p| p.pv_sod).sum();
            info!(
                "Loaded {} positions from {}: total notional {:.0}, total PV {:.0}",
                positions.len(),
                path.display(),
                total_notional,
                total_pv
            );
            positions
        }
        Err(e) => {
            error!("Failed to load positions from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn read_positions(path: &Path) -> Result<Vec<Position>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.display().to_string()));
    }

    let mut reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns = PositionColumns::from_headers(&headers)?;

    let mut positions = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping positions row {}: {}", row + 1, e);
                continue;
            }
        };
        match columns.parse(&record) {
            Ok(position) => positions.push(position),
            Err(reason) => warn!("Skipping positions row {}: {}", row + 1, reason),
        }
    }

    Ok(positions)
}

struct PositionColumns {
    cusip: usize,
    notional: usize,
    pv_sod: usize,
    dv01: Vec<(usize, Tenor)>,
}

impl PositionColumns {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|&&c| find(c).is_none())
            .map(|c| c.to_string())
            .collect();
        let (Some(cusip), Some(notional), Some(pv_sod)) =
            (find("cusip"), find("notional"), find("pv_sod"))
        else {
            return Err(LoadError::MissingColumns(missing));
        };

        let mut dv01 = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            let Some(label) = header.strip_prefix(DV01_PREFIX) else {
                continue;
            };
            match Tenor::from_str(label) {
                Ok(tenor) => dv01.push((idx, tenor)),
                Err(_) => warn!("Ignoring column {}: unknown tenor '{}'", header, label),
            }
        }
        if dv01.is_empty() {
            warn!("No DV01 columns found in positions file");
        }

        Ok(Self {
            cusip,
            notional,
            pv_sod,
            dv01,
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<Position, String> {
        let cusip = field(record, self.cusip, "cusip")?;
        if cusip.is_empty() {
            return Err("empty cusip".to_string());
        }
        let notional = number(record, self.notional, "notional")?;
        let pv_sod = number(record, self.pv_sod, "pv_sod")?;

        let mut dv01_bucketed = BTreeMap::new();
        for &(idx, tenor) in &self.dv01 {
            let raw = field(record, idx, tenor.label())?;
            let value = if raw.is_empty() {
                0.0
            } else {
                parse_finite(raw, tenor.label())?
            };
            dv01_bucketed.insert(tenor, value);
        }

        Ok(Position::new(cusip, notional, pv_sod, dv01_bucketed))
    }
}

fn field<'r>(record: &'r StringRecord, idx: usize, name: &str) -> Result<&'r str, String> {
    record
        .get(idx)
        .ok_or_else(|| format!("missing value for {}", name))
}

fn number(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    parse_finite(field(record, idx, name)?, name)
}

fn parse_finite(raw: &str, name: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("invalid {} '{}'", name, raw)),
    }
}

/// Checks loaded positions for values the engine cannot value sensibly.
///
/// Logs each problem found; returns `false` for an empty list.
pub fn validate_positions(positions: &[Position]) -> bool {
    if positions.is_empty() {
        warn!("No positions to validate");
        return false;
    }

    let mut valid = true;
    for (i, position) in positions.iter().enumerate() {
        if position.id.trim().is_empty() {
            error!("Position {} has an empty identifier", i);
            valid = false;
        }
        if !position.notional.is_finite() || !position.pv_sod.is_finite() {
            error!("Position {} ({}) has a non-finite amount", i, position.id);
            valid = false;
        }
        if position.dv01_bucketed.values().any(|v| !v.is_finite()) {
            error!("Position {} ({}) has a non-finite DV01", i, position.id);
            valid = false;
        }
    }

    if valid {
        info!("Validated {} positions", positions.len());
    }
    valid
}
