//! Pixel selection under a region.
//!
//! The grid is first cropped to the region's bounding box; inside that
//! window a pixel is kept when its centre falls inside the region.

use aod_common::{BoundingBox, Grid};

use crate::error::{Result, ZonalError};
use crate::region::Region;

/// A half-open pixel window `[col_start, col_end) x [row_start, row_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub col_start: usize,
    pub col_end: usize,
    pub row_start: usize,
    pub row_end: usize,
}

impl PixelWindow {
    pub fn width(&self) -> usize {
        self.col_end - self.col_start
    }

    pub fn height(&self) -> usize {
        self.row_end - self.row_start
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Pixels of `grid` touched by `bbox`, or `None` when they do not overlap.
pub fn window(grid: &Grid, bbox: &BoundingBox) -> Option<PixelWindow> {
    let overlap = grid.bounds().intersection(bbox)?;

    let (c0, r0) = grid.transform.coord_to_pixel(overlap.min_x, overlap.max_y);
    let (c1, r1) = grid.transform.coord_to_pixel(overlap.max_x, overlap.min_y);

    let clamp = |v: f64, max: usize| (v.max(0.0) as usize).min(max);
    let col_start = clamp(c0.min(c1).floor(), grid.width);
    let col_end = clamp(c0.max(c1).ceil(), grid.width);
    let row_start = clamp(r0.min(r1).floor(), grid.height);
    let row_end = clamp(r0.max(r1).ceil(), grid.height);

    let window = PixelWindow {
        col_start,
        col_end,
        row_start,
        row_end,
    };
    (!window.is_empty()).then_some(window)
}

/// Flat indices of the pixels whose centre lies inside `region`.
///
/// Fails with [`ZonalError::NoOverlap`] when the region's bounding box
/// misses the grid entirely.
pub fn masked_pixels(grid: &Grid, region: &Region) -> Result<Vec<usize>> {
    let no_overlap = || ZonalError::NoOverlap {
        region: region.id.clone(),
    };
    let bbox = region.bbox().ok_or_else(no_overlap)?;
    let window = window(grid, &bbox).ok_or_else(no_overlap)?;

    let mut pixels = Vec::new();
    for row in window.row_start..window.row_end {
        for col in window.col_start..window.col_end {
            let (x, y) = grid.transform.pixel_center(col, row);
            if region.contains_point(x, y) {
                pixels.push(row * grid.width + col);
            }
        }
    }
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{constant_grid, geographic_transform};

    #[test]
    fn test_window_clamps_to_grid() {
        let grid = constant_grid(10, 10, geographic_transform(0.0, 10.0, 1.0), 1);
        let w = window(&grid, &BoundingBox::new(-5.0, 7.5, 2.5, 20.0)).unwrap();
        assert_eq!(
            w,
            PixelWindow {
                col_start: 0,
                col_end: 3,
                row_start: 0,
                row_end: 3
            }
        );
    }

    #[test]
    fn test_window_outside() {
        let grid = constant_grid(10, 10, geographic_transform(0.0, 10.0, 1.0), 1);
        assert!(window(&grid, &BoundingBox::new(20.0, 20.0, 30.0, 30.0)).is_none());
    }

    #[test]
    fn test_centre_rule() {
        let grid = constant_grid(4, 4, geographic_transform(0.0, 4.0, 1.0), 1);
        // Keeps pixels whose centre satisfies x + y < 3.6.
        let region = Region::from_ring("t", vec![(0.0, 0.0), (3.6, 0.0), (0.0, 3.6)]);
        let pixels = masked_pixels(&grid, &region).unwrap();
        assert_eq!(pixels, vec![4, 8, 9, 12, 13, 14]);
    }

    #[test]
    fn test_no_overlap() {
        let grid = constant_grid(4, 4, geographic_transform(0.0, 4.0, 1.0), 1);
        let region = Region::from_ring("far", vec![(50.0, 50.0), (51.0, 50.0), (51.0, 51.0)]);
        assert!(matches!(
            masked_pixels(&grid, &region),
            Err(ZonalError::NoOverlap { .. })
        ));
    }
}
