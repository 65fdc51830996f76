//! Pull pipeline: locate stations, fetch each one's observations and write
//! the SnowModel files.
//!
//! Stations are processed one after another. A station whose fetch comes
//! back empty is skipped; any other failure aborts the run.

use anyhow::Context;
use log::{info, warn};
use std::path::PathBuf;

use crate::config::PullConfig;
use sm_cdec::boundary::Boundary;
use sm_cdec::source::StationSource;
use sm_cdec::variable::{SiteKind, Variable};
use sm_data::metadata::{metadata_rows, write_metadata};
use sm_data::snowmodel::{format_observations, write_observations};

/// Variables used to find stations.
pub const SEARCH_VARIABLES: [Variable; 1] = [Variable::Swe];
/// Variables fetched for every station; density is derived from both.
pub const PULL_VARIABLES: [Variable; 2] = [Variable::Swe, Variable::SnowDepth];

/// Station counts for one site kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PullSummary {
    pub located: usize,
    pub written: usize,
    pub skipped: usize,
}

/// Locate the snow courses and write the metadata table.
pub async fn run_metadata<S: StationSource>(
    source: &S,
    boundary: &Boundary,
    config: &PullConfig,
) -> anyhow::Result<PathBuf> {
    info!("Finding all snow courses for the metadata table...");
    let stations = source
        .locate(boundary, &SEARCH_VARIABLES, SiteKind::SnowCourse)
        .await
        .context("Failed to locate snow courses")?;
    let rows = metadata_rows(&stations, &config.state_code)
        .context("Snow course metadata is incomplete")?;
    let path = config.metadata_path();
    write_metadata(&path, &rows)?;
    Ok(path)
}

/// Pull and write observation files for every station of `kind`, up to
/// the configured limit.
pub async fn run_site_kind<S: StationSource>(
    source: &S,
    boundary: &Boundary,
    config: &PullConfig,
    kind: SiteKind,
) -> anyhow::Result<PullSummary> {
    info!("Finding all {}s inside the boundary...", kind);
    let stations = source
        .locate(boundary, &SEARCH_VARIABLES, kind)
        .await
        .with_context(|| format!("Failed to locate {}s", kind))?;
    let take = config.limit.unwrap_or(stations.len()).min(stations.len());

    let mut summary = PullSummary {
        located: stations.len(),
        ..PullSummary::default()
    };
    for station in &stations[..take] {
        info!("Pulling {}", station.station_id);
        let records = source
            .fetch(
                station,
                kind,
                &config.start_date,
                &config.end_date,
                &PULL_VARIABLES,
            )
            .await
            .with_context(|| format!("Failed to fetch {} {}", kind, station.station_id))?;

        let rows = match records {
            Some(records) => format_observations(&records, kind),
            None => Vec::new(),
        };
        if rows.is_empty() {
            warn!("No data for {} {}, skipping", kind, station.station_id);
            summary.skipped += 1;
            continue;
        }
        write_observations(
            &config.output_dir,
            &config.state_code,
            &station.station_id,
            kind,
            &rows,
        )?;
        summary.written += 1;
    }

    info!(
        "{}s: {} located, {} processed, {} written, {} skipped",
        kind, summary.located, take, summary.written, summary.skipped
    );
    Ok(summary)
}

/// Metadata first, then snow courses, then sensor sites.
pub async fn run_all<S: StationSource>(
    source: &S,
    boundary: &Boundary,
    config: &PullConfig,
) -> anyhow::Result<(PullSummary, PullSummary)> {
    run_metadata(source, boundary, config).await?;
    let courses = run_site_kind(source, boundary, config, SiteKind::SnowCourse).await?;
    let sensors = run_site_kind(source, boundary, config, SiteKind::Sensor).await?;
    Ok((courses, sensors))
}
