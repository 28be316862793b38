//! Error types for raster storage.

use std::path::PathBuf;

use aod_common::GridError;
use thiserror::Error;

/// Errors that can occur reading or writing rasters on disk.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// A GeoTIFF lacks the tags needed to place it on the map.
    #[error("missing georeferencing in {path}: {detail}")]
    MissingGeoreference { path: String, detail: String },

    /// Pixels are stored in a type the pipeline does not handle.
    #[error("unsupported sample type in {path}: {found}")]
    UnsupportedSampleType { path: String, found: String },

    /// GeoKeys describe a CRS outside the supported set.
    #[error("unsupported CRS in {path}: {detail}")]
    UnsupportedCrs { path: String, detail: String },

    /// Pages of a multi-band file disagree in size or type.
    #[error("inconsistent bands in {path}: {detail}")]
    InconsistentBands { path: String, detail: String },

    /// The nodata sentinel has no Int16 representation.
    #[error("nodata {value} cannot be stored as Int16; set a nodata override")]
    InvalidNodata { value: f64 },

    /// A write-once target already exists.
    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
