//! Generators for synthetic AOD grids and granules.
//!
//! These generators create predictable, verifiable data patterns that can be
//! used across the test suite. All generated grids are north-up.

use aod_common::{CrsCode, GeoTransform, Grid, Raster, Samples};

use crate::fixtures::MODIS_FILL_VALUE;

/// Creates a row-major buffer with predictable values.
///
/// Each cell value is calculated as: `col * 100 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_values;
///
/// let values = create_test_values(10, 5);
/// assert_eq!(values.len(), 50);
/// assert_eq!(values[1], 100); // col=1, row=0
/// assert_eq!(values[10], 1);  // col=0, row=1
/// ```
pub fn create_test_values(width: usize, height: usize) -> Vec<i16> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 100 + row) as i16);
        }
    }
    data
}

/// A geographic transform with square `res`-degree pixels whose upper-left
/// corner sits at `(west, north)`.
pub fn geographic_transform(west: f64, north: f64, res: f64) -> GeoTransform {
    GeoTransform::new(west, res, north, -res)
}

/// An Int16 EPSG:4326 grid holding `value` everywhere.
pub fn constant_grid(width: usize, height: usize, transform: GeoTransform, value: i16) -> Grid {
    Grid::new(
        width,
        height,
        transform,
        CrsCode::Epsg4326,
        MODIS_FILL_VALUE,
        Samples::I16(vec![value; width * height]),
    )
    .expect("constant grid has a consistent shape")
}

/// An Int16 EPSG:4326 grid built from explicit row-major values.
pub fn grid_from_values(width: usize, transform: GeoTransform, values: Vec<i16>) -> Grid {
    let height = values.len() / width;
    Grid::new(
        width,
        height,
        transform,
        CrsCode::Epsg4326,
        MODIS_FILL_VALUE,
        Samples::I16(values),
    )
    .expect("grid values fill whole rows")
}

/// A multi-band Int16 raster, one band per overpass, in `crs`.
pub fn granule_raster(
    width: usize,
    height: usize,
    transform: GeoTransform,
    crs: CrsCode,
    bands: Vec<Vec<i16>>,
) -> Raster {
    Raster::new(
        width,
        height,
        transform,
        crs,
        MODIS_FILL_VALUE,
        bands.into_iter().map(Samples::I16).collect(),
    )
    .expect("granule bands match the raster shape")
}

/// A granule whose every band holds `values[band]` in every pixel.
pub fn constant_granule(
    width: usize,
    height: usize,
    transform: GeoTransform,
    values: &[i16],
) -> Raster {
    let bands = values.iter().map(|v| vec![*v; width * height]).collect();
    granule_raster(width, height, transform, CrsCode::Epsg4326, bands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_values() {
        let values = create_test_values(3, 2);
        assert_eq!(values, vec![0, 100, 200, 1, 101, 201]);
    }

    #[test]
    fn test_constant_grid() {
        let grid = constant_grid(4, 3, geographic_transform(-120.0, 38.0, 0.5), 42);
        assert_eq!(grid.len(), 12);
        assert_eq!(grid.valid_value(3, 2), Some(42.0));
        assert_eq!(grid.bounds().min_y, 36.5);
    }

    #[test]
    fn test_constant_granule_bands() {
        let raster = constant_granule(2, 2, geographic_transform(0.0, 2.0, 1.0), &[1, 2, 3]);
        assert_eq!(raster.band_count(), 3);
        assert_eq!(raster.band(2).unwrap().valid_value(0, 0), Some(3.0));
    }
}
