//! Warping a grid into another CRS.
//!
//! The output georeferencing comes from [`projection::default_transform`]:
//! the source edges are projected into the target CRS to find the extent,
//! and square pixels keep roughly the source pixel count. Each output pixel
//! centre is mapped back into the source CRS and takes the value of the
//! source pixel it lands in. Cells that map outside the source, or outside
//! either projection's domain, are filled with the nodata sentinel.

use aod_common::{CrsCode, GeoTransform, Grid, Sample, Samples};
use projection::{default_transform, CrsTransform};
use rayon::prelude::*;
use tracing::debug;

use super::interpolation::nearest_interpolate;
use crate::error::Result;

/// Reproject a grid into `target` using nearest-neighbor resampling.
///
/// A grid already in `target` (or an equivalent CRS) is returned with its
/// pixels and georeferencing unchanged. The sample type and nodata value are
/// always preserved.
pub fn reproject(grid: &Grid, target: CrsCode) -> Result<Grid> {
    if grid.crs.is_equivalent(&target) {
        let mut out = grid.clone();
        out.crs = target;
        return Ok(out);
    }

    let warp = default_transform(grid.crs, target, grid.width, grid.height, &grid.transform)?;
    // Output pixel centres are mapped back into the source CRS.
    let back = CrsTransform::new(target, grid.crs);

    let samples = match &grid.samples {
        Samples::I16(data) => Samples::I16(warp_nearest(
            data,
            grid,
            &back,
            &warp.transform,
            warp.width,
            warp.height,
        )),
        Samples::F32(data) => Samples::F32(warp_nearest(
            data,
            grid,
            &back,
            &warp.transform,
            warp.width,
            warp.height,
        )),
    };

    debug!(
        src_crs = %grid.crs,
        dst_crs = %target,
        src_width = grid.width,
        src_height = grid.height,
        dst_width = warp.width,
        dst_height = warp.height,
        "Reprojected grid"
    );

    Ok(Grid::new(
        warp.width,
        warp.height,
        warp.transform,
        target,
        grid.nodata,
        samples,
    )?)
}

fn warp_nearest<T: Sample>(
    data: &[T],
    src: &Grid,
    back: &CrsTransform,
    dst_transform: &GeoTransform,
    dst_width: usize,
    dst_height: usize,
) -> Vec<T> {
    let fill = T::from_f64(src.nodata);
    let mut output = vec![fill; dst_width * dst_height];

    output
        .par_chunks_mut(dst_width)
        .enumerate()
        .for_each(|(row, out_row)| {
            for (col, cell) in out_row.iter_mut().enumerate() {
                let (x, y) = dst_transform.pixel_center(col, row);
                if let Some((sx, sy)) = back.apply(x, y) {
                    *cell = nearest_interpolate(
                        data,
                        &src.transform,
                        src.width,
                        src.height,
                        sx,
                        sy,
                        fill,
                    );
                }
            }
        });

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geographic_grid() -> Grid {
        Grid::new(
            4,
            2,
            GeoTransform::new(-120.0, 0.5, 40.0, -0.5),
            CrsCode::Epsg4326,
            -28672.0,
            Samples::I16(vec![1, 2, 3, 4, 5, 6, 7, -28672]),
        )
        .unwrap()
    }

    #[test]
    fn test_same_crs_is_unchanged() {
        let grid = geographic_grid();
        let out = reproject(&grid, CrsCode::Epsg4326).unwrap();
        assert_eq!(out, grid);
    }

    #[test]
    fn test_equivalent_crs_relabels_only() {
        let grid = geographic_grid();
        let out = reproject(&grid, CrsCode::Epsg4269).unwrap();
        assert_eq!(out.crs, CrsCode::Epsg4269);
        assert_eq!(out.samples, grid.samples);
        assert_eq!(out.transform, grid.transform);
    }

    #[test]
    fn test_roundtrip_keeps_values_and_type() {
        let grid = geographic_grid();
        let merc = reproject(&grid, CrsCode::Epsg3857).unwrap();
        assert_eq!(merc.crs, CrsCode::Epsg3857);
        assert_eq!(merc.sample_type(), grid.sample_type());
        assert_eq!(merc.nodata, grid.nodata);

        // Every value in the warped grid comes from the source.
        let source: Vec<f64> = (0..grid.len()).filter_map(|i| grid.samples.get(i)).collect();
        for i in 0..merc.len() {
            let v = merc.samples.get(i).unwrap();
            assert!(source.contains(&v), "unexpected value {}", v);
        }
        assert!(merc.valid_count() > 0);
    }
}
