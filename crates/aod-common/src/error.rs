//! Error types for raster containers.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised when building grids and rasters.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("sample buffer holds {actual} values but {width}x{height} grid needs {expected}")]
    ShapeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("raster has no bands")]
    NoBands,

    #[error("bands disagree on sample type")]
    MixedSampleTypes,

    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
}
