//! Snow course metadata table: `statecode, station ID, lat, lon, elev`.
//!
//! The column order is fixed; downstream readers rely on it.

use csv::WriterBuilder;
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::error::{FormatError, Result};
use sm_cdec::station::Station;

/// Default metadata file name.
pub const METADATA_FILE: &str = "Sierras_COURSE_station_info.csv";

pub const METADATA_COLUMNS: [&str; 5] = ["statecode", "station ID", "lat", "lon", "elev"];

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct MetadataRow {
    pub statecode: String,
    pub station_id: String,
    pub lat: f64,
    pub lon: f64,
    /// Feet
    pub elev: f64,
}

/// Build one row per station. A station without elevation fails the whole
/// table instead of producing a malformed row.
pub fn metadata_rows(stations: &[Station], state_code: &str) -> Result<Vec<MetadataRow>> {
    stations
        .iter()
        .map(|station| {
            station
                .elevation
                .map(|elev| MetadataRow {
                    statecode: state_code.to_string(),
                    station_id: station.station_id.clone(),
                    lat: station.latitude(),
                    lon: station.longitude(),
                    elev,
                })
                .ok_or_else(|| FormatError::MissingElevation(station.station_id.clone()))
        })
        .collect()
}

/// Serialize rows with a header row and no index column.
pub fn write_metadata_to<W: Write>(writer: W, rows: &[MetadataRow]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(METADATA_COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write (or overwrite) the metadata file at `path`.
pub fn write_metadata<P: AsRef<Path>>(path: P, rows: &[MetadataRow]) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_metadata_to(file, rows)?;
    info!(
        "Wrote {} station rows to {}",
        rows.len(),
        path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations() -> Vec<Station> {
        vec![
            Station::new("BLK", "Black Mountain", -120.683, 39.95, Some(6500.0)),
            Station::new("GRZ", "Grizzly Ridge", -120.8, 40.0, Some(6900.0)),
        ]
    }

    #[test]
    fn test_metadata_rows() {
        let rows = metadata_rows(&stations(), "CA").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].statecode, "CA");
        assert_eq!(rows[0].station_id, "BLK");
        assert_eq!(rows[0].lat, 39.95);
        assert_eq!(rows[0].lon, -120.683);
        assert_eq!(rows[1].elev, 6900.0);
    }

    #[test]
    fn test_missing_elevation_is_an_error() {
        let mut input = stations();
        input.push(Station::new("NOE", "No Elevation", -120.0, 39.0, None));
        match metadata_rows(&input, "CA") {
            Err(FormatError::MissingElevation(id)) => assert_eq!(id, "NOE"),
            other => panic!("expected missing elevation, got {:?}", other),
        }
    }

    #[test]
    fn test_write_metadata_column_order() {
        let rows = metadata_rows(&stations(), "CA").unwrap();
        let mut buffer: Vec<u8> = Vec::new();
        write_metadata_to(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "statecode,station ID,lat,lon,elev\nCA,BLK,39.95,-120.683,6500.0\nCA,GRZ,40.0,-120.8,6900.0\n"
        );
    }

    #[test]
    fn test_write_empty_metadata_keeps_header() {
        let mut buffer: Vec<u8> = Vec::new();
        write_metadata_to(&mut buffer, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "statecode,station ID,lat,lon,elev\n"
        );
    }

    #[test]
    fn test_write_metadata_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(METADATA_FILE);
        let rows = metadata_rows(&stations(), "CA").unwrap();
        write_metadata(&path, &rows).unwrap();
        write_metadata(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
