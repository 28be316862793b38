//! Nodata-excluding zonal mean.

use aod_common::Grid;
use tracing::debug;

use crate::error::{Result, ZonalError};
use crate::mask::masked_pixels;
use crate::region::Region;

/// Pixel counts and mean for one region over one grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZonalStats {
    /// Pixels whose centre lies inside the region.
    pub pixel_count: usize,
    /// Of those, pixels holding a valid measurement.
    pub valid_count: usize,
    /// Mean of the valid pixels, `None` when there are none.
    pub mean: Option<f64>,
}

/// Statistics of `grid` under `region`.
///
/// Fails with [`ZonalError::NoOverlap`] when the region misses the grid.
pub fn zonal_stats(grid: &Grid, region: &Region) -> Result<ZonalStats> {
    let pixels = masked_pixels(grid, region)?;

    let mut sum = 0.0;
    let mut valid_count = 0usize;
    for &index in &pixels {
        if let Some(v) = grid.samples.get(index).filter(|v| !grid.is_nodata(*v)) {
            sum += v;
            valid_count += 1;
        }
    }

    Ok(ZonalStats {
        pixel_count: pixels.len(),
        valid_count,
        mean: (valid_count > 0).then(|| sum / valid_count as f64),
    })
}

/// Mean of the valid pixels of `grid` under `region`.
///
/// `None` when the region misses the grid, covers no pixel centre, or only
/// covers nodata.
pub fn zonal_mean(grid: &Grid, region: &Region) -> Option<f64> {
    match zonal_stats(grid, region) {
        Ok(stats) => stats.mean,
        Err(ZonalError::NoOverlap { region }) => {
            debug!(region = %region, "Region outside grid");
            None
        }
        Err(e) => {
            debug!(region = %region.id, error = %e, "Zonal statistics failed");
            None
        }
    }
}
