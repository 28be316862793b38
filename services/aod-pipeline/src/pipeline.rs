//! Composite and zonal stages wired to the configured directories.

use anyhow::{bail, Context, Result};
use aod_common::DateKey;
use ingestion::{BuildSummary, CompositeScheduler, DailyCompositeBuilder};
use storage::{CompositeStore, GranuleSource};
use tracing::{info, warn};
use zonal::{load_regions, TimeSeries, ZonalEngine};

use crate::config::PipelineConfig;

/// Build daily composites for `dates`, or for every date with granules.
pub async fn run_composites(config: &PipelineConfig, dates: &[DateKey]) -> Result<BuildSummary> {
    let builder = DailyCompositeBuilder::new(
        GranuleSource::new(config.granule_dir()),
        CompositeStore::new(config.composite_dir()),
        config.composite.clone(),
    );
    let scheduler = CompositeScheduler::new(builder, config.parallel_dates)?;

    let summary = if dates.is_empty() {
        scheduler.run_all().await?
    } else {
        scheduler.run(dates.iter().copied()).await?
    };

    for (date, error) in &summary.failed {
        warn!(date = %date, error = %error, "Date failed");
    }
    Ok(summary)
}

/// Compute the zonal table over every stored composite and write it out.
pub async fn run_zonal(config: &PipelineConfig) -> Result<TimeSeries> {
    let Some(regions_path) = config.regions.clone() else {
        bail!("No region file configured (set AOD_REGIONS or --regions)");
    };
    let zonal_config = config.zonal.clone();
    let store = CompositeStore::new(config.composite_dir());
    let table = config.table_path();

    tokio::task::spawn_blocking(move || -> Result<TimeSeries> {
        let regions = load_regions(&regions_path, &zonal_config)
            .with_context(|| format!("Failed to load regions from {}", regions_path.display()))?;
        let engine = ZonalEngine::new(regions, zonal_config.region_crs);
        let series = engine.assemble(&store)?;
        series
            .write_csv_path(&table)
            .with_context(|| format!("Failed to write {}", table.display()))?;
        info!(rows = series.len(), absent = series.absent_count(), "Zonal stage complete");
        Ok(series)
    })
    .await?
}

/// One-line summary for the console.
pub fn describe(summary: &BuildSummary) -> String {
    let mut line = format!(
        "{} dates: {} built, {} already present, {} without data, {} failed",
        summary.total(),
        summary.built.len(),
        summary.existing.len(),
        summary.empty.len(),
        summary.failed.len()
    );
    if summary.skipped_files > 0 {
        line.push_str(&format!(
            "; {} dated files skipped (not GeoTIFF)",
            summary.skipped_files
        ));
    }
    line
}
