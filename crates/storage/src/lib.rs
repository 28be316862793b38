//! Raster storage for the AOD pipeline.
//!
//! Provides:
//! - GeoTIFF reading and writing (multi-page for multi-band rasters)
//! - Discovery of raw granules by their embedded date code
//! - The write-once daily composite store

pub mod composite_store;
pub mod error;
pub mod geotiff;
pub mod granule_source;

pub use composite_store::CompositeStore;
pub use error::{Result, StorageError};
pub use geotiff::{read_grid, read_raster, write_grid, write_raster};
pub use granule_source::{granule_date, Granule, GranuleScan, GranuleSource};
