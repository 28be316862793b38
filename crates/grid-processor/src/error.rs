//! Error types for grid processing.

use aod_common::{GridError, SampleType};
use projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur during grid processing.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// The caller broke the operation's input contract.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Grids handed to one operation disagree on sample type.
    #[error("sample type mismatch: expected {expected}, found {found} in grid {index}")]
    FormatMismatch {
        expected: SampleType,
        found: SampleType,
        index: usize,
    },

    /// Coordinate transformation failed.
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// A result grid could not be assembled.
    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl GridProcessorError {
    /// Create an InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a ConfigError.
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
