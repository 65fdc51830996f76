//! Per-station observation files in the SnowModel layout.
//!
//! Columns are `Y, M, D, swe, depth, density` with SWE in millimeters,
//! depth in centimeters and density in kg/m³, one decimal place each.
//! Files are named `{statecode}_{stationID}_{SNOCOURSE|SMSITE}.csv` and
//! are overwritten on every run.

use csv::WriterBuilder;
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::units::{density, inches_to_cm, inches_to_mm};
use sm_cdec::observation::SnowObservation;
use sm_cdec::variable::SiteKind;
use sm_utils::dates::{day_padded, month_abbrev, year};

pub const SNOWMODEL_COLUMNS: [&str; 6] = ["Y", "M", "D", "swe", "depth", "density"];

/// One formatted output row.
#[derive(Debug, PartialEq, Clone)]
pub struct SnowModelRow {
    pub year: i32,
    /// Three letter month, e.g. "Jan"
    pub month: String,
    /// Two digit day of month
    pub day: String,
    /// mm
    pub swe: Option<f64>,
    /// cm
    pub depth: Option<f64>,
    /// kg/m³; 0.0 unless both swe and depth are positive
    pub density: f64,
}

impl SnowModelRow {
    pub fn from_observation(record: &SnowObservation, kind: SiteKind) -> SnowModelRow {
        let date = kind.record_date(record);
        let swe = record.swe.map(inches_to_mm);
        let depth = record.depth.map(inches_to_cm);
        let rho = match (swe, depth) {
            (Some(s), Some(d)) => density(s, d).unwrap_or(0.0),
            _ => 0.0,
        };
        SnowModelRow {
            year: year(&date),
            month: month_abbrev(&date),
            day: day_padded(&date),
            swe,
            depth,
            density: rho,
        }
    }

    fn to_record(&self) -> [String; 6] {
        let one_decimal = |v: Option<f64>| v.map(|v| format!("{:.1}", v)).unwrap_or_default();
        [
            self.year.to_string(),
            self.month.clone(),
            self.day.clone(),
            one_decimal(self.swe),
            one_decimal(self.depth),
            format!("{:.1}", self.density),
        ]
    }
}

/// Convert one station's raw observations into output rows.
pub fn format_observations(records: &[SnowObservation], kind: SiteKind) -> Vec<SnowModelRow> {
    records
        .iter()
        .map(|record| SnowModelRow::from_observation(record, kind))
        .collect()
}

/// `CA_ABC_SMSITE.csv` style output name.
pub fn output_file_name(state_code: &str, station_id: &str, kind: SiteKind) -> String {
    format!("{}_{}_{}.csv", state_code, station_id, kind.tag())
}

/// Serialize rows with a header row and no index column.
pub fn write_rows_to<W: Write>(writer: W, rows: &[SnowModelRow]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(SNOWMODEL_COLUMNS)?;
    for row in rows {
        wtr.write_record(row.to_record())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write (truncating any previous file) one station's rows into `dir`.
pub fn write_observations(
    dir: &Path,
    state_code: &str,
    station_id: &str,
    kind: SiteKind,
    rows: &[SnowModelRow],
) -> Result<PathBuf> {
    let path = dir.join(output_file_name(state_code, station_id, kind));
    info!("Outputting data to {}", path.display());
    let file = std::fs::File::create(&path)?;
    write_rows_to(file, rows)?;
    Ok(path)
}
