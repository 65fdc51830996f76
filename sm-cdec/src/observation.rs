use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CdecError, Result};
use crate::variable::Variable;
use sm_utils::dates::parse_date_compact;

/// Date format used for CDEC API query parameters: "YYYY-MM-DD"
pub const YEAR_FORMAT: &str = "%Y-%m-%d";

/// Minimum number of columns in a CDEC CSV row:
/// `STATION_ID,DURATION,SENSOR_NUMBER,SENSOR_TYPE,DATE TIME,OBS DATE,VALUE,DATA_FLAG,UNITS`
pub const CSV_ROW_LENGTH: usize = 9;

/// CDEC writes this sentinel for readings that were never taken.
pub const MISSING_SENTINEL: f64 = -9999.0;

const SENSOR_NUMBER_IDX: usize = 2;
const DATE_TIME_IDX: usize = 4;
const OBS_DATE_IDX: usize = 5;
const VALUE_IDX: usize = 6;

/// One raw snow observation for a station on a reporting date, in inches.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SnowObservation {
    pub station_id: String,
    /// Reporting timestamp ("DATE TIME"); first of the month for snow courses
    pub date: NaiveDate,
    /// Date the measurement was actually taken ("OBS DATE")
    pub measurement_date: NaiveDate,
    /// Snow water equivalent, inches
    pub swe: Option<f64>,
    /// Snow depth, inches
    pub depth: Option<f64>,
}

impl SnowObservation {
    /// Parse a CDEC `CSVDataServlet` body holding SWE and/or snow depth
    /// sensors into one observation per reporting date, sorted by date.
    ///
    /// Malformed rows and rows for other sensors are skipped. Dates where
    /// neither SWE nor depth carries a value are dropped.
    pub fn parse_cdec_csv(body: &str) -> Result<Vec<SnowObservation>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let headers = rdr.headers()?.clone();
        if headers.len() < CSV_ROW_LENGTH {
            return Err(CdecError::InvalidFormat(format!(
                "expected {} columns, found {}",
                CSV_ROW_LENGTH,
                headers.len()
            )));
        }

        let mut by_date: BTreeMap<NaiveDate, SnowObservation> = BTreeMap::new();
        let mut skipped = 0u32;
        for row in rdr.records() {
            let record = match row {
                Ok(r) => r,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };
            match RawReading::try_from(&record) {
                Ok(reading) => reading.merge_into(&mut by_date),
                Err(()) => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!("Skipped {} unusable CDEC rows", skipped);
        }

        Ok(by_date
            .into_values()
            .filter(|obs| obs.swe.is_some() || obs.depth.is_some())
            .collect())
    }

    /// Parse a single CDEC value cell.
    ///
    /// `---`, `ART`, `BRT`, text and the `-9999` sentinel are missing.
    pub fn parse_value(cell: &str) -> Option<f64> {
        match cell.trim() {
            "---" | "ART" | "BRT" | "" => None,
            s => s
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v != MISSING_SENTINEL),
        }
    }
}

/// Turn one `CSVDataServlet` response into a station's observations.
///
/// `Ok(None)` means CDEC has nothing for the station: an empty body (or the
/// two byte `[]` CDEC sends for unknown stations), a header-only CSV, or rows
/// without a single usable SWE or depth value.
pub fn observations_from_body(body: &str) -> Result<Option<Vec<SnowObservation>>> {
    if body.trim().len() <= 2 {
        return Ok(None);
    }
    let observations = SnowObservation::parse_cdec_csv(body)?;
    if observations.is_empty() {
        return Ok(None);
    }
    Ok(Some(observations))
}

/// A single sensor reading row from the CDEC CSV.
struct RawReading {
    station_id: String,
    variable: Variable,
    date: NaiveDate,
    measurement_date: NaiveDate,
    value: Option<f64>,
}

impl RawReading {
    fn merge_into(self, by_date: &mut BTreeMap<NaiveDate, SnowObservation>) {
        let entry = by_date.entry(self.date).or_insert_with(|| SnowObservation {
            station_id: self.station_id.clone(),
            date: self.date,
            measurement_date: self.measurement_date,
            swe: None,
            depth: None,
        });
        // the SWE survey date wins when sensors disagree
        match self.variable {
            Variable::Swe => {
                entry.swe = self.value;
                entry.measurement_date = self.measurement_date;
            }
            Variable::SnowDepth => entry.depth = self.value,
        }
    }
}

impl TryFrom<&StringRecord> for RawReading {
    type Error = ();

    fn try_from(value: &StringRecord) -> std::result::Result<Self, Self::Error> {
        let station_id = value.get(0).filter(|s| !s.is_empty()).ok_or(())?;
        let variable = value
            .get(SENSOR_NUMBER_IDX)
            .and_then(|s| s.parse::<u32>().ok())
            .and_then(Variable::from_sensor_number)
            .ok_or(())?;
        let date = value
            .get(DATE_TIME_IDX)
            .and_then(|s| parse_date_compact(s).ok())
            .ok_or(())?;
        let measurement_date = value
            .get(OBS_DATE_IDX)
            .and_then(|s| parse_date_compact(s).ok())
            .unwrap_or(date);
        let value = value.get(VALUE_IDX).and_then(SnowObservation::parse_value);
        Ok(RawReading {
            station_id: station_id.to_string(),
            variable,
            date,
            measurement_date,
            value,
        })
    }
}

#[cfg(test)]
mod test {
    use super::{observations_from_body, SnowObservation};
    use chrono::NaiveDate;

    // https://cdec.water.ca.gov/dynamicapp/req/CSVDataServlet?Stations=GRZ&SensorNums=3,18&dur_code=D&Start=2024-01-14&End=2024-01-16
    const DAILY_RESULT: &str = r#"STATION_ID,DURATION,SENSOR_NUMBER,SENSOR_TYPE,DATE TIME,OBS DATE,VALUE,DATA_FLAG,UNITS
GRZ,D,3,SNOW WC,20240114 0000,20240114 0000,12.48, ,INCHES
GRZ,D,3,SNOW WC,20240115 0000,20240115 0000,12.60, ,INCHES
GRZ,D,3,SNOW WC,20240116 0000,20240116 0000,---, ,INCHES
GRZ,D,18,SNOW DP,20240114 0000,20240114 0000,41, ,INCHES
GRZ,D,18,SNOW DP,20240115 0000,20240115 0000,-9999, ,INCHES
GRZ,D,18,SNOW DP,20240116 0000,20240116 0000,BRT, ,INCHES
"#;

    // https://cdec.water.ca.gov/dynamicapp/req/CSVDataServlet?Stations=BLK&SensorNums=3,18&dur_code=M&Start=2024-02-01&End=2024-03-31
    const MONTHLY_RESULT: &str = r#"STATION_ID,DURATION,SENSOR_NUMBER,SENSOR_TYPE,DATE TIME,OBS DATE,VALUE,DATA_FLAG,UNITS
BLK,M,18,SNOW DP,20240301 0000,20240228 0000,70, ,INCHES
BLK,M,3,SNOW WC,20240201 0000,20240130 0000,18.3, ,INCHES
BLK,M,18,SNOW DP,20240201 0000,20240130 0000,61, ,INCHES
BLK,M,3,SNOW WC,20240301 0000,20240227 0000,25.1, ,INCHES
"#;

    #[test]
    fn test_parse_daily_groups_sensors_by_date() {
        let observations = SnowObservation::parse_cdec_csv(DAILY_RESULT).unwrap();
        // 2024-01-16 has no usable SWE or depth
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].station_id, "GRZ");
        assert_eq!(
            observations[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()
        );
        assert_eq!(observations[0].swe, Some(12.48));
        assert_eq!(observations[0].depth, Some(41.0));
        assert_eq!(observations[1].swe, Some(12.60));
        assert_eq!(observations[1].depth, None);
    }

    #[test]
    fn test_parse_monthly_keeps_survey_date() {
        let observations = SnowObservation::parse_cdec_csv(MONTHLY_RESULT).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(
            observations[0].date,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        assert_eq!(
            observations[0].measurement_date,
            NaiveDate::from_ymd_opt(2024, 1, 30).unwrap()
        );
        assert_eq!(
            observations[1].measurement_date,
            NaiveDate::from_ymd_opt(2024, 2, 27).unwrap()
        );
        assert_eq!(observations[1].swe, Some(25.1));
        assert_eq!(observations[1].depth, Some(70.0));
    }

    #[test]
    fn test_parse_header_only_is_empty() {
        let body = "STATION_ID,DURATION,SENSOR_NUMBER,SENSOR_TYPE,DATE TIME,OBS DATE,VALUE,DATA_FLAG,UNITS\n";
        let observations = SnowObservation::parse_cdec_csv(body).unwrap();
        assert!(observations.is_empty());
    }

    #[test]
    fn test_parse_rejects_unexpected_layout() {
        assert!(SnowObservation::parse_cdec_csv("a,b,c\n1,2,3\n").is_err());
    }

    #[test]
    fn test_observations_from_body() {
        assert_eq!(observations_from_body("").unwrap(), None);
        assert_eq!(observations_from_body(" \r\n").unwrap(), None);
        assert_eq!(observations_from_body("[]").unwrap(), None);
        let header = "STATION_ID,DURATION,SENSOR_NUMBER,SENSOR_TYPE,DATE TIME,OBS DATE,VALUE,DATA_FLAG,UNITS\n";
        assert_eq!(observations_from_body(header).unwrap(), None);

        let all_missing = format!(
            "{}GRZ,D,3,SNOW WC,20240116 0000,20240116 0000,---, ,INCHES\n",
            header
        );
        assert_eq!(observations_from_body(&all_missing).unwrap(), None);

        let observations = observations_from_body(DAILY_RESULT).unwrap().unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].swe, Some(12.48));
    }

    #[test]
    fn test_observations_from_body_rejects_garbage() {
        assert!(observations_from_body("<html>Service unavailable</html>").is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(SnowObservation::parse_value("12.5"), Some(12.5));
        assert_eq!(SnowObservation::parse_value(" 0 "), Some(0.0));
        assert_eq!(SnowObservation::parse_value("---"), None);
        assert_eq!(SnowObservation::parse_value("ART"), None);
        assert_eq!(SnowObservation::parse_value("-9999"), None);
        assert_eq!(SnowObservation::parse_value("n/a"), None);
    }
}
