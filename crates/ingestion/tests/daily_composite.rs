//! End-to-end tests for the daily composite builder and scheduler.

use aod_common::{CrsCode, DateKey, GeoTransform};
use grid_processor::{CompositeConfig, MergePolicy};
use ingestion::{CompositeOutcome, CompositeScheduler, DailyCompositeBuilder, IngestionError};
use storage::{write_raster, CompositeStore, GranuleSource};
use test_utils::{
    constant_granule, geographic_transform, granule_raster, modis, pipeline_dirs, PipelineDirs,
    MODIS_FILL_VALUE,
};

const FILL: i16 = MODIS_FILL_VALUE as i16;

fn day(code: &str) -> DateKey {
    DateKey::parse(code).unwrap()
}

fn builder(dirs: &PipelineDirs, config: CompositeConfig) -> DailyCompositeBuilder {
    DailyCompositeBuilder::new(
        GranuleSource::new(&dirs.granules),
        CompositeStore::new(&dirs.composites),
        config,
    )
}

/// Two overlapping granules on 2024-015, plus a corrupt file on each day.
fn seed_granules(dirs: &PipelineDirs) {
    let t = geographic_transform(-120.0, 37.0, 0.5);
    write_raster(
        &dirs.granules.join("MCD19A2.A2024015.h08v05.061.0001.tif"),
        &constant_granule(2, 2, t, &[10, FILL, 30]),
    )
    .unwrap();
    write_raster(
        &dirs.granules.join("MCD19A2.A2024015.h08v05.061.0002.tif"),
        &constant_granule(2, 2, t, &[99]),
    )
    .unwrap();
    std::fs::write(
        dirs.granules.join("MCD19A2.A2024015.h09v05.061.0003.tif"),
        b"not a tiff",
    )
    .unwrap();
    std::fs::write(
        dirs.granules.join("MCD19A2.A2024016.h08v05.061.0001.tif"),
        b"truncated",
    )
    .unwrap();
}

// =============================================================================
// Builder
// =============================================================================

#[test]
fn test_build_skips_failed_granule() {
    let dirs = pipeline_dirs();
    seed_granules(&dirs);
    let builder = builder(&dirs, CompositeConfig::default());

    let outcome = builder.build(day("2024015")).unwrap();
    match outcome {
        CompositeOutcome::Written {
            granules_used,
            granules_failed,
            ..
        } => {
            assert_eq!(granules_used, 2);
            assert_eq!(granules_failed, 1);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let composite = builder.store().get(day("2024015")).unwrap();
    assert_eq!((composite.width, composite.height), (2, 2));
    // First granule (mean 20) wins over the second (99).
    assert_eq!(composite.valid_value(1, 1), Some(20.0));
}

#[test]
fn test_zero_contributions_writes_nothing() {
    let dirs = pipeline_dirs();
    seed_granules(&dirs);
    let builder = builder(&dirs, CompositeConfig::default());

    let outcome = builder.build(day("2024016")).unwrap();
    assert_eq!(
        outcome,
        CompositeOutcome::NoContributions { granules_failed: 1 }
    );
    assert!(!builder.store().exists(day("2024016")));

    // A date with no files at all behaves the same.
    let outcome = builder.build(day("2024100")).unwrap();
    assert_eq!(
        outcome,
        CompositeOutcome::NoContributions { granules_failed: 0 }
    );
}

#[test]
fn test_sinusoidal_granules_land_in_geographic() {
    let dirs = pipeline_dirs();
    let pixels = 20;
    let pixel = modis::TILE_SIZE / pixels as f64;
    for (h, value) in [(8u32, 100i16), (9, 200)] {
        let (x0, y0) = modis::tile_origin(h, 5);
        let raster = granule_raster(
            pixels,
            pixels,
            GeoTransform::new(x0, pixel, y0, -pixel),
            CrsCode::ModisSinusoidal,
            vec![vec![value; pixels * pixels], vec![FILL; pixels * pixels]],
        );
        let name = format!("MCD19A2.A2024015.h{:02}v05.061.0001.tif", h);
        write_raster(&dirs.granules.join(name), &raster).unwrap();
    }

    let builder = builder(&dirs, CompositeConfig::default());
    builder.build(day("2024015")).unwrap();

    let composite = builder.store().get(day("2024015")).unwrap();
    assert_eq!(composite.crs, CrsCode::Epsg4326);
    let bounds = composite.bounds();
    assert!(bounds.min_x < -130.0 && bounds.max_x > -95.0, "{:?}", bounds);

    let mut seen = std::collections::BTreeSet::new();
    for i in 0..composite.len() {
        seen.insert(composite.samples.get(i).unwrap() as i64);
    }
    assert!(seen.contains(&100));
    assert!(seen.contains(&200));
    assert!(seen.iter().all(|v| [100, 200, FILL as i64].contains(v)));
}

// =============================================================================
// Scheduler
// =============================================================================

#[tokio::test]
async fn test_scheduler_runs_all_dates() {
    let dirs = pipeline_dirs();
    seed_granules(&dirs);
    let config = CompositeConfig {
        merge_policy: MergePolicy::Max,
        ..Default::default()
    };
    let scheduler = CompositeScheduler::new(builder(&dirs, config), 4).unwrap();

    let summary = scheduler.run_all().await.unwrap();
    assert_eq!(summary.built.len(), 1);
    assert_eq!(summary.built[0].0, day("2024015"));
    assert_eq!(summary.empty, vec![day("2024016")]);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.skipped_files, 0);

    let composite = scheduler.builder().store().get(day("2024015")).unwrap();
    assert_eq!(composite.valid_value(0, 0), Some(99.0));

    // A second run finds the composite in place and leaves it alone.
    let again = scheduler.run_all().await.unwrap();
    assert_eq!(again.existing, vec![day("2024015")]);
    assert!(again.built.is_empty());
}

#[tokio::test]
async fn test_scheduler_deduplicates_dates() {
    let dirs = pipeline_dirs();
    seed_granules(&dirs);
    let scheduler =
        CompositeScheduler::new(builder(&dirs, CompositeConfig::default()), 2).unwrap();

    let summary = scheduler
        .run(vec![day("2024015"), day("2024015"), day("2024015")])
        .await
        .unwrap();
    assert_eq!(summary.total(), 1);
    assert_eq!(summary.built.len(), 1);
}

#[tokio::test]
async fn test_scheduler_counts_non_geotiff_downloads() {
    let dirs = pipeline_dirs();
    seed_granules(&dirs);
    std::fs::write(
        dirs.granules.join("MCD19A2.A2024017.h08v05.061.2024019010203.hdf"),
        b"hdf",
    )
    .unwrap();
    let scheduler =
        CompositeScheduler::new(builder(&dirs, CompositeConfig::default()), 2).unwrap();

    let summary = scheduler.run_all().await.unwrap();
    assert_eq!(summary.skipped_files, 1);
    // The HDF date is not scheduled.
    assert_eq!(summary.total(), 2);
}

#[test]
fn test_scheduler_rejects_zero_parallelism() {
    let dirs = pipeline_dirs();
    let result = CompositeScheduler::new(builder(&dirs, CompositeConfig::default()), 0);
    assert!(matches!(result, Err(IngestionError::InvalidConfig(_))));
}
