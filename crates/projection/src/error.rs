//! Error types for coordinate transformations.

use aod_common::crs::CrsParseError;
use thiserror::Error;

/// Errors raised while transforming coordinates between CRSs.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error(transparent)]
    InvalidCrs(#[from] CrsParseError),

    #[error("point ({x}, {y}) cannot be transformed from {src} to {dst}")]
    OutOfDomain {
        x: f64,
        y: f64,
        src: String,
        dst: String,
    },

    #[error("no edge of the {width}x{height} source grid transforms from {src} to {dst}")]
    NoValidPoints {
        src: String,
        dst: String,
        width: usize,
        height: usize,
    },
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
