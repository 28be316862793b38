//! Error types for zonal statistics.

use projection::ProjectionError;
use storage::StorageError;
use thiserror::Error;

/// Errors that can occur loading regions or computing zonal statistics.
#[derive(Error, Debug)]
pub enum ZonalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// A feature cannot be turned into a region.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// The region and the grid share no pixels.
    #[error("Region {region} does not overlap the grid")]
    NoOverlap { region: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for zonal operations.
pub type Result<T> = std::result::Result<T, ZonalError>;
