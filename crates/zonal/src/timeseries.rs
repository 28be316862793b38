//! Per-region, per-date means assembled into a long-format table.

use std::io::Write;
use std::path::Path;

use aod_common::{CrsCode, DateKey, Grid};
use rayon::prelude::*;
use serde::Serialize;
use storage::CompositeStore;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::region::{reproject_regions, Region};
use crate::stats::zonal_mean;

/// One (region, date) outcome. `mean` is `None` when no valid pixel was
/// found; that is not the same as a mean of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalSample {
    pub region: String,
    pub date: DateKey,
    pub mean: Option<f64>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    date: String,
    mean_aod: Option<f64>,
}

/// Zonal samples ordered by region, then date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    rows: Vec<ZonalSample>,
}

impl TimeSeries {
    pub fn new(mut rows: Vec<ZonalSample>) -> Self {
        rows.sort_by(|a, b| a.region.cmp(&b.region).then(a.date.cmp(&b.date)));
        Self { rows }
    }

    pub fn rows(&self) -> &[ZonalSample] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, region: &str, date: DateKey) -> Option<&ZonalSample> {
        self.rows
            .binary_search_by(|s| s.region.as_str().cmp(region).then(s.date.cmp(&date)))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Rows without a valid mean.
    pub fn absent_count(&self) -> usize {
        self.rows.iter().filter(|s| s.mean.is_none()).count()
    }

    /// Write `id,date,mean_aod` CSV; absent means are empty fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for sample in &self.rows {
            csv.serialize(CsvRow {
                id: &sample.region,
                date: sample.date.to_date().format("%Y-%m-%d").to_string(),
                mean_aod: sample.mean,
            })?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the table to `path`, creating parent directories.
    pub fn write_csv_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))?;
        info!(
            path = %path.display(),
            rows = self.len(),
            absent = self.absent_count(),
            "Wrote zonal table"
        );
        Ok(())
    }
}

/// Computes zonal means of a fixed region set over daily composites.
#[derive(Debug, Clone)]
pub struct ZonalEngine {
    regions: Vec<Region>,
    region_crs: CrsCode,
}

impl ZonalEngine {
    /// `regions` have coordinates in `region_crs`; they are reprojected into
    /// each composite's CRS as needed.
    pub fn new(regions: Vec<Region>, region_crs: CrsCode) -> Self {
        Self {
            regions,
            region_crs,
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// One sample per region for the composite of `date`.
    #[instrument(skip(self, grid), fields(date = %date, regions = self.regions.len()))]
    pub fn sample_composite(&self, date: DateKey, grid: &Grid) -> Vec<ZonalSample> {
        let projected = if self.region_crs.is_equivalent(&grid.crs) {
            None
        } else {
            Some(self.project_regions(grid.crs))
        };

        self.regions
            .iter()
            .enumerate()
            .map(|(i, region)| {
                let mean = match &projected {
                    None => zonal_mean(grid, region),
                    Some(projected) => projected[i].as_ref().and_then(|r| zonal_mean(grid, r)),
                };
                ZonalSample {
                    region: region.id.clone(),
                    date,
                    mean,
                }
            })
            .collect()
    }

    /// Reproject each region on its own so one bad geometry only loses
    /// that region.
    fn project_regions(&self, target: CrsCode) -> Vec<Option<Region>> {
        self.regions
            .iter()
            .map(|region| {
                match reproject_regions(std::slice::from_ref(region), self.region_crs, target) {
                    Ok(mut out) => out.pop(),
                    Err(e) => {
                        warn!(
                            region = %region.id,
                            crs = %target,
                            error = %e,
                            "Region reprojection failed"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    /// Samples for every region over every composite in `store`.
    ///
    /// A composite that cannot be read contributes absent samples.
    pub fn assemble(&self, store: &CompositeStore) -> Result<TimeSeries> {
        let composites = store.list()?;
        info!(
            composites = composites.len(),
            regions = self.regions.len(),
            "Computing zonal statistics"
        );

        let rows: Vec<ZonalSample> = composites
            .par_iter()
            .flat_map_iter(|(date, path)| match storage::read_grid(path) {
                Ok(grid) => self.sample_composite(*date, &grid),
                Err(e) => {
                    warn!(date = %date, path = %path.display(), error = %e, "Unreadable composite");
                    self.absent_samples(*date)
                }
            })
            .collect();

        Ok(TimeSeries::new(rows))
    }

    fn absent_samples(&self, date: DateKey) -> Vec<ZonalSample> {
        self.regions
            .iter()
            .map(|r| ZonalSample {
                region: r.id.clone(),
                date,
                mean: None,
            })
            .collect()
    }
}
