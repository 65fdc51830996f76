//! Run configuration: command line flags and their validated form.

use anyhow::bail;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

use sm_data::metadata::METADATA_FILE;
use sm_utils::dates::{format_date, parse_date};

pub const DEFAULT_BOUNDARY: &str = "sierras_outline.shp";
pub const DEFAULT_STATE_CODE: &str = "CA";
/// Water year 2024
pub const DEFAULT_START_DATE: &str = "2023-10-01";
pub const DEFAULT_END_DATE: &str = "2024-09-30";

#[derive(Args, Debug, Clone)]
pub struct PullArgs {
    /// Polygon boundary file (.shp, .geojson or .json) in longitude/latitude
    #[arg(short = 'b', long, value_name = "FILE", default_value = DEFAULT_BOUNDARY)]
    pub boundary: PathBuf,

    /// State code written into file names and the metadata table
    #[arg(long, default_value = DEFAULT_STATE_CODE)]
    pub state_code: String,

    /// First day of the fetch window
    #[arg(
        long,
        value_name = "YYYY-MM-DD",
        value_parser = parse_date,
        default_value = DEFAULT_START_DATE
    )]
    pub start_date: NaiveDate,

    /// Last day of the fetch window
    #[arg(
        long,
        value_name = "YYYY-MM-DD",
        value_parser = parse_date,
        default_value = DEFAULT_END_DATE
    )]
    pub end_date: NaiveDate,

    /// Process at most this many stations of each kind (all when omitted)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Directory the CSV files are written to
    #[arg(short = 'o', long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// File name of the snow course metadata table
    #[arg(long, value_name = "NAME", default_value = METADATA_FILE)]
    pub metadata_file: String,

    /// Local snow course catalog CSV used instead of the CDEC station search
    #[arg(long, value_name = "CSV")]
    pub course_catalog: Option<PathBuf>,

    /// Local sensor site catalog CSV used instead of the CDEC station search
    #[arg(long, value_name = "CSV")]
    pub sensor_catalog: Option<PathBuf>,
}

/// Validated settings for one pull run.
#[derive(Debug, Clone, PartialEq)]
pub struct PullConfig {
    pub boundary: PathBuf,
    pub state_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub limit: Option<usize>,
    pub output_dir: PathBuf,
    pub metadata_file: String,
    pub course_catalog: Option<PathBuf>,
    pub sensor_catalog: Option<PathBuf>,
}

impl PullConfig {
    pub fn metadata_path(&self) -> PathBuf {
        self.output_dir.join(&self.metadata_file)
    }
}

impl Default for PullConfig {
    fn default() -> Self {
        PullConfig {
            boundary: PathBuf::from(DEFAULT_BOUNDARY),
            state_code: String::from(DEFAULT_STATE_CODE),
            start_date: NaiveDate::from_ymd_opt(2023, 10, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 9, 30).unwrap_or_default(),
            limit: None,
            output_dir: PathBuf::from("."),
            metadata_file: String::from(METADATA_FILE),
            course_catalog: None,
            sensor_catalog: None,
        }
    }
}

impl TryFrom<PullArgs> for PullConfig {
    type Error = anyhow::Error;

    fn try_from(args: PullArgs) -> Result<Self, Self::Error> {
        if args.start_date > args.end_date {
            bail!(
                "start date {} is after end date {}",
                format_date(&args.start_date),
                format_date(&args.end_date)
            );
        }
        if args.state_code.trim().is_empty() {
            bail!("state code must not be empty");
        }
        if args.metadata_file.trim().is_empty() {
            bail!("metadata file name must not be empty");
        }
        Ok(PullConfig {
            boundary: args.boundary,
            state_code: args.state_code.trim().to_string(),
            start_date: args.start_date,
            end_date: args.end_date,
            limit: args.limit,
            output_dir: args.output_dir,
            metadata_file: args.metadata_file,
            course_catalog: args.course_catalog,
            sensor_catalog: args.sensor_catalog,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: PullArgs,
    }

    #[test]
    fn test_defaults_match_deployment() {
        let cli = TestCli::try_parse_from(["sm"]).unwrap();
        let config = PullConfig::try_from(cli.args).unwrap();
        assert_eq!(config, PullConfig::default());
        assert_eq!(
            config.metadata_path(),
            PathBuf::from("./Sierras_COURSE_station_info.csv")
        );
    }

    #[test]
    fn test_flags() {
        let cli = TestCli::try_parse_from([
            "sm",
            "--boundary",
            "tahoe.geojson",
            "--state-code",
            "NV",
            "--start-date",
            "2022-10-01",
            "--end-date",
            "2023-09-30",
            "--limit",
            "3",
            "--output-dir",
            "out",
        ])
        .unwrap();
        let config = PullConfig::try_from(cli.args).unwrap();
        assert_eq!(config.boundary, PathBuf::from("tahoe.geojson"));
        assert_eq!(config.state_code, "NV");
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2022, 10, 1).unwrap());
        assert_eq!(config.limit, Some(3));
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_bad_date_rejected_by_parser() {
        assert!(TestCli::try_parse_from(["sm", "--start-date", "10/01/2023"]).is_err());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let cli = TestCli::try_parse_from([
            "sm",
            "--start-date",
            "2024-09-30",
            "--end-date",
            "2023-10-01",
        ])
        .unwrap();
        assert!(PullConfig::try_from(cli.args).is_err());
    }
}
