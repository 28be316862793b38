//! Integration tests chaining band reduction, reprojection and mosaicking.

use aod_common::{CrsCode, GeoTransform, Samples};
use grid_processor::{mosaic, reduce_bands, reproject, GridProcessorError, MergePolicy};
use test_utils::{
    assert_approx_eq, constant_granule, geographic_transform, granule_raster, modis,
    MODIS_FILL_VALUE,
};

const FILL: i16 = MODIS_FILL_VALUE as i16;

// =============================================================================
// Band Reduction
// =============================================================================

#[test]
fn test_reduce_mean_ignores_fill() {
    let raster = constant_granule(1, 1, geographic_transform(-120.0, 37.0, 0.01), &[10, FILL, 30]);
    let grid = reduce_bands(&raster).unwrap();
    assert_eq!(grid.valid_value(0, 0), Some(20.0));
}

#[test]
fn test_reduce_all_fill_stays_fill() {
    let raster = constant_granule(2, 2, geographic_transform(-120.0, 37.0, 0.01), &[FILL, FILL]);
    let grid = reduce_bands(&raster).unwrap();
    assert_eq!(grid.valid_count(), 0);
    assert_eq!(grid.samples, Samples::I16(vec![FILL; 4]));
}

// =============================================================================
// Reprojection
// =============================================================================

#[test]
fn test_reproject_sinusoidal_tile_to_geographic() {
    let pixels = 12;
    let pixel = modis::TILE_SIZE / pixels as f64;
    let (x0, y0) = modis::tile_origin(8, 5);
    let raster = granule_raster(
        pixels,
        pixels,
        GeoTransform::new(x0, pixel, y0, -pixel),
        CrsCode::ModisSinusoidal,
        vec![vec![150; pixels * pixels]],
    );

    let grid = reduce_bands(&raster).unwrap();
    let warped = reproject(&grid, CrsCode::Epsg4326).unwrap();

    assert_eq!(warped.crs, CrsCode::Epsg4326);
    assert_eq!(warped.nodata, MODIS_FILL_VALUE);
    let bounds = warped.bounds();
    assert_approx_eq!(bounds.max_y, 40.0, 0.1);
    assert_approx_eq!(bounds.min_y, 30.0, 0.1);

    // Nearest-neighbor never invents values.
    for i in 0..warped.len() {
        let v = warped.samples.get(i).unwrap();
        assert!(v == 150.0 || v == MODIS_FILL_VALUE, "unexpected value {}", v);
    }
    // The tile is a trapezoid in lon/lat, so some corners are empty.
    assert!(warped.valid_count() > 0);
    assert!(warped.valid_count() < warped.len());
}

// =============================================================================
// Mosaicking
// =============================================================================

#[test]
fn test_daily_composite_first_valid_wins() {
    let t = geographic_transform(-120.0, 37.0, 0.01);
    let a = reduce_bands(&constant_granule(1, 1, t, &[10, FILL, 30])).unwrap();
    let b = reduce_bands(&constant_granule(1, 1, t, &[99])).unwrap();

    let composite = mosaic(&[a, b], MergePolicy::First).unwrap();
    assert_eq!(composite.valid_value(0, 0), Some(20.0));
}

#[test]
fn test_fill_never_overwrites_valid() {
    let t = geographic_transform(-120.0, 37.0, 0.01);
    let a = reduce_bands(&constant_granule(1, 1, t, &[FILL])).unwrap();
    let b = reduce_bands(&constant_granule(1, 1, t, &[42])).unwrap();

    for policy in [
        MergePolicy::First,
        MergePolicy::Last,
        MergePolicy::Min,
        MergePolicy::Max,
    ] {
        let composite = mosaic(&[a.clone(), b.clone()], policy).unwrap();
        assert_eq!(composite.valid_value(0, 0), Some(42.0), "policy {}", policy);
    }
}

#[test]
fn test_adjacent_tiles_cover_union() {
    let west_tile = constant_granule(10, 10, geographic_transform(-121.0, 38.0, 0.1), &[5]);
    let east_tile = constant_granule(10, 10, geographic_transform(-120.0, 38.0, 0.1), &[7]);
    let west = reduce_bands(&west_tile).unwrap();
    let east = reduce_bands(&east_tile).unwrap();

    let composite = mosaic(&[west, east], MergePolicy::First).unwrap();
    assert_eq!((composite.width, composite.height), (20, 10));
    assert_eq!(composite.valid_count(), 200);
    assert_eq!(composite.valid_value(0, 0), Some(5.0));
    assert_eq!(composite.valid_value(19, 9), Some(7.0));
}

#[test]
fn test_mosaic_requires_common_crs() {
    let tile = constant_granule(1, 1, geographic_transform(0.0, 1.0, 1.0), &[1]);
    let geographic = reduce_bands(&tile).unwrap();
    let merc = reproject(&geographic, CrsCode::Epsg3857).unwrap();
    let result = mosaic(&[geographic, merc], MergePolicy::First);
    assert!(matches!(result, Err(GridProcessorError::InvalidInput(_))));
}
