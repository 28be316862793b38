//! Merging co-registered grids into one.
//!
//! Output georeferencing:
//!
//! ```text
//!   resolution  = first grid's pixel size
//!   extent      = union of every input's bounds
//!   origin      = (extent.min_x, extent.max_y), north-up
//!   width/height = extent / resolution, rounded to whole pixels
//! ```
//!
//! Inputs are painted in order. Every output cell centre samples the input
//! pixel beneath it; valid values are merged under the [`MergePolicy`] and
//! sentinels never overwrite anything.

use aod_common::{is_nodata, BoundingBox, GeoTransform, Grid, Sample, Samples};
use rayon::prelude::*;
use tracing::debug;

use crate::config::MergePolicy;
use crate::error::{GridProcessorError, Result};
use crate::projection::nearest_index;

/// Mosaic grids sharing one CRS and sample type into a single grid.
pub fn mosaic(grids: &[Grid], policy: MergePolicy) -> Result<Grid> {
    let first = grids
        .first()
        .ok_or_else(|| GridProcessorError::invalid_input("no grids to mosaic"))?;

    for (index, grid) in grids.iter().enumerate().skip(1) {
        if grid.sample_type() != first.sample_type() {
            return Err(GridProcessorError::FormatMismatch {
                expected: first.sample_type(),
                found: grid.sample_type(),
                index,
            });
        }
        if !grid.crs.is_equivalent(&first.crs) {
            return Err(GridProcessorError::invalid_input(format!(
                "grid {} is in {}, expected {}",
                index, grid.crs, first.crs
            )));
        }
    }

    let extent = grids
        .iter()
        .skip(1)
        .fold(first.bounds(), |acc, g| acc.union(&g.bounds()));
    let (res_x, res_y) = first.transform.resolution();
    let width = ((extent.width() / res_x).round() as usize).max(1);
    let height = ((extent.height() / res_y).round() as usize).max(1);
    let transform = GeoTransform::new(extent.min_x, res_x, extent.max_y, -res_y);

    let samples = match &first.samples {
        Samples::I16(_) => Samples::I16(paint(grids, policy, &transform, width, height, |s| {
            match s {
                Samples::I16(v) => Some(v.as_slice()),
                _ => None,
            }
        })),
        Samples::F32(_) => Samples::F32(paint(grids, policy, &transform, width, height, |s| {
            match s {
                Samples::F32(v) => Some(v.as_slice()),
                _ => None,
            }
        })),
    };

    debug!(
        inputs = grids.len(),
        width,
        height,
        policy = %policy,
        "Mosaicked grids"
    );

    Ok(Grid::new(
        width,
        height,
        transform,
        first.crs,
        first.nodata,
        samples,
    )?)
}

fn paint<T: Sample>(
    grids: &[Grid],
    policy: MergePolicy,
    transform: &GeoTransform,
    width: usize,
    height: usize,
    view: impl Fn(&Samples) -> Option<&[T]>,
) -> Vec<T> {
    let nodata = grids[0].nodata;
    let mut output = vec![T::from_f64(nodata); width * height];
    let mut filled = vec![false; width * height];

    for grid in grids {
        let Some(data) = view(&grid.samples) else {
            continue;
        };
        let (cols, rows) = window(transform, width, height, &grid.bounds());

        output
            .par_chunks_mut(width)
            .zip(filled.par_chunks_mut(width))
            .enumerate()
            .filter(|(row, _)| rows.contains(row))
            .for_each(|(row, (out_row, filled_row))| {
                for col in cols.clone() {
                    let (x, y) = transform.pixel_center(col, row);
                    let Some(idx) =
                        nearest_index(&grid.transform, grid.width, grid.height, x, y)
                    else {
                        continue;
                    };
                    let value = data[idx].to_f64();
                    if is_nodata(value, grid.nodata) {
                        continue;
                    }
                    if filled_row[col] {
                        let merged = policy.combine(out_row[col].to_f64(), value);
                        out_row[col] = T::from_f64(merged);
                    } else {
                        out_row[col] = data[idx];
                        filled_row[col] = true;
                    }
                }
            });
    }

    output
}

/// Output column and row ranges that can overlap `bounds`.
fn window(
    transform: &GeoTransform,
    width: usize,
    height: usize,
    bounds: &BoundingBox,
) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
    let (c0, r0) = transform.coord_to_pixel(bounds.min_x, bounds.max_y);
    let (c1, r1) = transform.coord_to_pixel(bounds.max_x, bounds.min_y);
    let clamp = |v: f64, max: usize| (v.max(0.0) as usize).min(max);
    let cols = clamp(c0.min(c1).floor(), width)..clamp(c0.max(c1).ceil(), width);
    let rows = clamp(r0.min(r1).floor(), height)..clamp(r0.max(r1).ceil(), height);
    (cols, rows)
}
