use csv::ReaderBuilder;
use geo::Point;
use serde::{Deserialize, Serialize};

use crate::error::{CdecError, Result};

/// Represents a CDEC snow measurement site, either a snow course or a
/// snow sensor station.
///
/// See: <https://cdec.water.ca.gov/reportapp/javareports?name=SnowSensors>
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Station {
    /// CDEC station identifier (e.g., "GRZ" for Grizzly Ridge)
    pub station_id: String,
    /// Human-readable name of the station
    pub name: String,
    /// Longitude (x) and latitude (y) in decimal degrees
    pub location: Point<f64>,
    /// Elevation in feet, when CDEC reports one
    pub elevation: Option<f64>,
}

impl Station {
    pub fn new(station_id: &str, name: &str, lon: f64, lat: f64, elevation: Option<f64>) -> Self {
        Station {
            station_id: station_id.to_string(),
            name: name.to_string(),
            location: Point::new(lon, lat),
            elevation,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }

    /// Parse a station catalog CSV into a vector of Stations.
    ///
    /// Expected CSV columns (with headers):
    /// `ID,NAME,ELEVATION,RIVER_BASIN,COUNTY,LATITUDE,LONGITUDE`.
    /// A blank elevation is kept as `None`; a blank or invalid coordinate
    /// is an error.
    pub fn parse_station_csv(csv_object: &str) -> Result<Vec<Station>> {
        let mut station_list: Vec<Station> = Vec::new();
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        for row in rdr.records() {
            let record = row?;
            let station_id = record
                .get(0)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| CdecError::InvalidFormat(String::from("missing station ID")))?;
            let name = record.get(1).unwrap_or_default();
            let elevation = record.get(2).and_then(parse_optional_number);
            let latitude = parse_coordinate(station_id, "latitude", record.get(5))?;
            let longitude = parse_coordinate(station_id, "longitude", record.get(6))?;
            station_list.push(Station::new(station_id, name, longitude, latitude, elevation));
        }
        Ok(station_list)
    }
}

/// Parse a numeric cell that may be blank or carry thousands separators
/// ("6,800").
pub(crate) fn parse_optional_number(cell: &str) -> Option<f64> {
    let cleaned = cell.trim().replace(',', "");
    match cleaned.to_lowercase().as_str() {
        "" | "null" | "n/a" | "na" => None,
        s => s.parse::<f64>().ok(),
    }
}

fn parse_coordinate(station_id: &str, field: &str, cell: Option<&str>) -> Result<f64> {
    cell.and_then(parse_optional_number).ok_or_else(|| {
        CdecError::InvalidFormat(format!("station {} has no usable {}", station_id, field))
    })
}
