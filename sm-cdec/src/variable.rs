use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::observation::SnowObservation;

/// A CDEC sensor variable that can be requested for a station.
///
/// See: <https://cdec.water.ca.gov/reportapp/javareports?name=SensList>
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Snow water content (SNOW WC), inches
    Swe,
    /// Snow depth (SNOW DP), inches
    SnowDepth,
}

impl Variable {
    /// CDEC sensor number used in query strings.
    pub fn sensor_number(&self) -> u32 {
        match self {
            Variable::Swe => 3,
            Variable::SnowDepth => 18,
        }
    }

    pub fn from_sensor_number(sensor: u32) -> Option<Variable> {
        match sensor {
            3 => Some(Variable::Swe),
            18 => Some(Variable::SnowDepth),
            _ => None,
        }
    }

    /// Comma separated sensor list, e.g. "3,18".
    pub fn sensor_list(variables: &[Variable]) -> String {
        variables
            .iter()
            .map(|v| v.sensor_number().to_string())
            .collect::<Vec<String>>()
            .join(",")
    }
}

/// Whether a site is a manually surveyed snow course or a continuously
/// logging sensor (pillow / depth sensor) site.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum SiteKind {
    SnowCourse,
    Sensor,
}

impl SiteKind {
    /// Site type tag used in the output file name.
    pub fn tag(&self) -> &'static str {
        match self {
            SiteKind::SnowCourse => "SNOCOURSE",
            SiteKind::Sensor => "SMSITE",
        }
    }

    /// CDEC duration code: snow courses report monthly, sensors daily.
    pub fn duration_code(&self) -> &'static str {
        match self {
            SiteKind::SnowCourse => "M",
            SiteKind::Sensor => "D",
        }
    }

    /// CDEC collection method filter for the station search, if any.
    pub fn collection_method(&self) -> Option<&'static str> {
        match self {
            SiteKind::SnowCourse => Some("MANUAL+ENTRY"),
            SiteKind::Sensor => None,
        }
    }

    /// Date of a record that the legacy format reports for this kind of site.
    ///
    /// Snow courses carry the survey date separately from the monthly
    /// reporting date; sensors only have the reporting timestamp.
    pub fn record_date(&self, record: &SnowObservation) -> NaiveDate {
        match self {
            SiteKind::SnowCourse => record.measurement_date,
            SiteKind::Sensor => record.date,
        }
    }
}

impl std::fmt::Display for SiteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiteKind::SnowCourse => write!(f, "snow course"),
            SiteKind::Sensor => write!(f, "sensor site"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_numbers() {
        assert_eq!(Variable::Swe.sensor_number(), 3);
        assert_eq!(Variable::SnowDepth.sensor_number(), 18);
        assert_eq!(Variable::from_sensor_number(18), Some(Variable::SnowDepth));
        assert_eq!(Variable::from_sensor_number(15), None);
        assert_eq!(
            Variable::sensor_list(&[Variable::Swe, Variable::SnowDepth]),
            "3,18"
        );
    }

    #[test]
    fn test_site_kind_tags() {
        assert_eq!(SiteKind::SnowCourse.tag(), "SNOCOURSE");
        assert_eq!(SiteKind::Sensor.tag(), "SMSITE");
        assert_eq!(SiteKind::SnowCourse.duration_code(), "M");
        assert_eq!(SiteKind::Sensor.duration_code(), "D");
    }

    #[test]
    fn test_record_date_selection() {
        let record = SnowObservation {
            station_id: String::from("BLK"),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            measurement_date: NaiveDate::from_ymd_opt(2024, 2, 27).unwrap(),
            swe: Some(10.0),
            depth: Some(30.0),
        };
        assert_eq!(
            SiteKind::SnowCourse.record_date(&record),
            NaiveDate::from_ymd_opt(2024, 2, 27).unwrap()
        );
        assert_eq!(
            SiteKind::Sensor.record_date(&record),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }
}
