//! Command implementations for the SnowModel CDEC pull CLI.
//!
//! Each subcommand loads the region boundary once, builds a CDEC client
//! and drives the pull pipeline in [`pull`].

use anyhow::Context;
use clap::Subcommand;
use log::info;
use std::path::Path;

use sm_cdec::boundary::Boundary;
use sm_cdec::client::CdecClient;
use sm_cdec::station::Station;
use sm_cdec::variable::SiteKind;

pub mod config;
pub mod pull;

use config::{PullArgs, PullConfig};

#[derive(Subcommand)]
pub enum Command {
    /// Write the snow course metadata table (statecode, station ID, lat, lon, elev)
    Metadata {
        #[command(flatten)]
        args: PullArgs,
    },

    /// Pull snow course observations into per-station SNOCOURSE files
    Courses {
        #[command(flatten)]
        args: PullArgs,
    },

    /// Pull snow sensor observations into per-station SMSITE files
    Sensors {
        #[command(flatten)]
        args: PullArgs,
    },

    /// Metadata table, then snow courses, then sensor sites
    Run {
        #[command(flatten)]
        args: PullArgs,
    },
}

fn load_catalog(path: &Path) -> anyhow::Result<Vec<Station>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read station catalog {}", path.display()))?;
    let stations = Station::parse_station_csv(&text)
        .with_context(|| format!("Failed to parse station catalog {}", path.display()))?;
    info!("Loaded {} stations from {}", stations.len(), path.display());
    Ok(stations)
}

fn build_client(config: &PullConfig) -> anyhow::Result<CdecClient> {
    let mut client = CdecClient::new()?;
    if let Some(path) = &config.course_catalog {
        client = client.with_catalog(SiteKind::SnowCourse, load_catalog(path)?);
    }
    if let Some(path) = &config.sensor_catalog {
        client = client.with_catalog(SiteKind::Sensor, load_catalog(path)?);
    }
    Ok(client)
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    let (args, kind) = match command {
        Command::Metadata { args } => (args, None),
        Command::Courses { args } => (args, Some(SiteKind::SnowCourse)),
        Command::Sensors { args } => (args, Some(SiteKind::Sensor)),
        Command::Run { args } => {
            let config = PullConfig::try_from(args)?;
            let (client, boundary) = prepare(&config)?;
            pull::run_all(&client, &boundary, &config).await?;
            return Ok(());
        }
    };

    let config = PullConfig::try_from(args)?;
    let (client, boundary) = prepare(&config)?;
    match kind {
        None => {
            let path = pull::run_metadata(&client, &boundary, &config).await?;
            info!("Metadata written to {}", path.display());
        }
        Some(kind) => {
            pull::run_site_kind(&client, &boundary, &config, kind).await?;
        }
    }
    Ok(())
}

fn prepare(config: &PullConfig) -> anyhow::Result<(CdecClient, Boundary)> {
    info!(
        "Pulling {} to {} using boundary {}",
        config.start_date,
        config.end_date,
        config.boundary.display()
    );
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;
    let boundary = Boundary::from_path(&config.boundary)?;
    let client = build_client(config)?;
    Ok((client, boundary))
}
