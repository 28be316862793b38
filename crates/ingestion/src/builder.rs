//! Daily composite building.
//!
//! For one date key: every granule is read, band-reduced and reprojected on
//! its own; a granule that fails any step is logged and left out. Only once
//! all granules are done are the survivors mosaicked and persisted.

use std::path::PathBuf;

use aod_common::{CrsCode, DateKey, Grid, Raster};
use grid_processor::{mosaic, reduce_bands, reproject, CompositeConfig};
use storage::{read_raster, CompositeStore, Granule, GranuleSource};
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::metadata::parse_granule_filename;

/// What happened when building one date.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositeOutcome {
    /// A composite was written.
    Written {
        path: PathBuf,
        granules_used: usize,
        granules_failed: usize,
    },
    /// The store already holds a composite for this date.
    AlreadyExists(PathBuf),
    /// No granule survived processing, so nothing was written.
    NoContributions { granules_failed: usize },
}

/// Reduce and reproject one granule into the composite CRS.
pub fn prepare_granule(raster: &Raster, target_crs: CrsCode) -> grid_processor::Result<Grid> {
    let reduced = reduce_bands(raster)?;
    reproject(&reduced, target_crs)
}

/// Composite already-loaded granule rasters in memory.
///
/// Granules that fail reduction or reprojection are skipped. Returns `None`
/// when none are left.
pub fn composite_rasters(rasters: &[Raster], config: &CompositeConfig) -> Result<Option<Grid>> {
    let mut grids = Vec::with_capacity(rasters.len());
    for (index, raster) in rasters.iter().enumerate() {
        match prepare_granule(raster, config.target_crs) {
            Ok(grid) => grids.push(grid),
            Err(e) => warn!(scene = index, error = %e, "Skipping granule"),
        }
    }
    merge(&grids, config)
}

fn merge(grids: &[Grid], config: &CompositeConfig) -> Result<Option<Grid>> {
    if grids.is_empty() {
        return Ok(None);
    }
    let mut composite = mosaic(grids, config.merge_policy)?;
    if let Some(nodata) = config.nodata_override {
        composite.replace_nodata(nodata);
    }
    Ok(Some(composite))
}

/// Builds the daily composite for a date key from a granule directory.
#[derive(Debug, Clone)]
pub struct DailyCompositeBuilder {
    source: GranuleSource,
    store: CompositeStore,
    config: CompositeConfig,
}

impl DailyCompositeBuilder {
    pub fn new(source: GranuleSource, store: CompositeStore, config: CompositeConfig) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    pub fn source(&self) -> &GranuleSource {
        &self.source
    }

    pub fn store(&self) -> &CompositeStore {
        &self.store
    }

    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    /// Scan the granule directory and build the composite for `date`.
    pub fn build(&self, date: DateKey) -> Result<CompositeOutcome> {
        let scan = self.source.scan()?;
        self.build_from(date, scan.granules(date))
    }

    /// Build and persist the composite for `date` from `granules`.
    ///
    /// Granule-level failures are isolated; only a failed mosaic or a failed
    /// write is returned as an error.
    #[instrument(skip(self, granules), fields(date = %date, granules = granules.len()))]
    pub fn build_from(&self, date: DateKey, granules: &[Granule]) -> Result<CompositeOutcome> {
        if self.store.exists(date) {
            let path = self.store.path_for(date);
            debug!(path = %path.display(), "Composite already exists");
            return Ok(CompositeOutcome::AlreadyExists(path));
        }

        info!("Building daily composite");

        let mut grids = Vec::with_capacity(granules.len());
        let mut failed = 0;
        for granule in granules {
            match self.process_granule(granule) {
                Ok(grid) => grids.push(grid),
                Err(e) => {
                    failed += 1;
                    warn!(
                        granule = %granule.path.display(),
                        scene = granule.scene,
                        error = %e,
                        "Skipping granule"
                    );
                }
            }
        }

        let Some(composite) = merge(&grids, &self.config)? else {
            warn!(granules_failed = failed, "No granules contributed");
            return Ok(CompositeOutcome::NoContributions {
                granules_failed: failed,
            });
        };

        let path = self.store.put(date, &composite)?;
        Ok(CompositeOutcome::Written {
            path,
            granules_used: grids.len(),
            granules_failed: failed,
        })
    }

    fn process_granule(&self, granule: &Granule) -> Result<Grid> {
        let raster = read_raster(&granule.path)?;
        if let Some(info) = parse_granule_filename(&granule.path) {
            debug!(
                product = %info.product,
                tile = ?info.tile.map(|t| t.to_string()),
                bands = raster.band_count(),
                "Processing granule"
            );
        }
        Ok(prepare_granule(&raster, self.config.target_crs)?)
    }
}
