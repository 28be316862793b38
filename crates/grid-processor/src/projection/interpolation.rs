//! Sampling helpers for grid resampling.

use aod_common::GeoTransform;

/// Flat index of the source pixel containing map point `(x, y)`.
///
/// Returns `None` when the point falls outside the `width` x `height` grid.
#[inline]
pub fn nearest_index(
    transform: &GeoTransform,
    width: usize,
    height: usize,
    x: f64,
    y: f64,
) -> Option<usize> {
    let (col, row) = transform.coord_to_pixel(x, y);
    if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
        return None;
    }
    let (col, row) = (col.floor() as usize, row.floor() as usize);
    if col >= width || row >= height {
        return None;
    }
    Some(row * width + col)
}

/// Nearest neighbor lookup.
///
/// Returns the value of the source pixel under `(x, y)`, or `fill` outside
/// the grid. Values are copied unchanged, sentinels included.
#[inline]
pub fn nearest_interpolate<T: Copy>(
    data: &[T],
    transform: &GeoTransform,
    width: usize,
    height: usize,
    x: f64,
    y: f64,
    fill: T,
) -> T {
    nearest_index(transform, width, height, x, y)
        .map(|i| data[i])
        .unwrap_or(fill)
}
