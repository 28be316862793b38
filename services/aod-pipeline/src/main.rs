//! AOD pipeline.
//!
//! Downloads MODIS MCD19A2 granules, fuses each day's granules into one
//! composite and summarises composites per region into a CSV time series.

mod acquire;
mod config;
mod pipeline;

use std::path::PathBuf;

use anyhow::{Context, Result};
use aod_common::DateKey;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use acquire::{check_year, BBox, Downloader};
use config::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "aod-pipeline")]
#[command(about = "Daily aerosol optical depth composites and regional time series")]
struct Args {
    /// YAML configuration file (defaults to environment variables)
    #[arg(short, long, env = "AOD_CONFIG")]
    config: Option<PathBuf>,

    /// Raw data directory
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Clean data directory
    #[arg(long)]
    clean_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download granules from LAADS DAAC
    Acquire {
        #[arg(long)]
        year: i32,

        /// Single month (default: the whole year, one query per month)
        #[arg(long)]
        month: Option<u32>,

        /// Search box as N,E,S,W
        #[arg(long)]
        bbox: Option<BBox>,
    },

    /// Build daily composites
    Composite {
        /// Date keys (YYYYDDD); default: every date with granules
        #[arg(long = "date")]
        dates: Vec<DateKey>,

        /// Concurrent dates
        #[arg(long)]
        parallel: Option<usize>,
    },

    /// Compute the regional time series over all composites
    Zonal {
        /// GeoJSON region file
        #[arg(long)]
        regions: Option<PathBuf>,

        /// Feature property holding the region id
        #[arg(long)]
        id_field: Option<String>,
    },

    /// Composite, then zonal
    Run {
        /// GeoJSON region file
        #[arg(long)]
        regions: Option<PathBuf>,

        /// Concurrent dates
        #[arg(long)]
        parallel: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_yaml(path)?,
        None => PipelineConfig::from_env()?,
    };
    if let Some(dir) = args.raw_dir {
        config.raw_dir = dir;
    }
    if let Some(dir) = args.clean_dir {
        config.clean_dir = dir;
    }

    match args.command {
        Command::Acquire { year, month, bbox } => {
            check_year(year)?;
            config.validate()?;
            let token = config
                .earthdata_token
                .clone()
                .context("EARTHDATA_TOKEN is required for downloads")?;
            let ranges = Downloader::ranges_for(year, month)?;
            let downloader = Downloader::new(config.granule_dir(), token, config.parallel_dates);
            downloader
                .download_all(bbox.unwrap_or_default(), ranges)
                .await?;
        }
        Command::Composite { dates, parallel } => {
            if let Some(n) = parallel {
                config.parallel_dates = n;
            }
            config.validate()?;
            let summary = pipeline::run_composites(&config, &dates).await?;
            println!("{}", pipeline::describe(&summary));
        }
        Command::Zonal { regions, id_field } => {
            if regions.is_some() {
                config.regions = regions;
            }
            if let Some(field) = id_field {
                config.zonal.id_field = field;
            }
            config.validate()?;
            let series = pipeline::run_zonal(&config).await?;
            println!(
                "{} rows ({} absent) written to {}",
                series.len(),
                series.absent_count(),
                config.table_path().display()
            );
        }
        Command::Run { regions, parallel } => {
            if regions.is_some() {
                config.regions = regions;
            }
            if let Some(n) = parallel {
                config.parallel_dates = n;
            }
            config.validate()?;
            let summary = pipeline::run_composites(&config, &[]).await?;
            println!("{}", pipeline::describe(&summary));
            let series = pipeline::run_zonal(&config).await?;
            println!(
                "{} rows ({} absent) written to {}",
                series.len(),
                series.absent_count(),
                config.table_path().display()
            );
        }
    }

    info!("Done");
    Ok(())
}
