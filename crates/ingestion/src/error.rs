//! Error types for the ingestion crate.

use grid_processor::GridProcessorError;
use storage::StorageError;
use thiserror::Error;

/// Errors that can occur while building daily composites.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Grid processing failed: {0}")]
    Processing(#[from] GridProcessorError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Composite task failed: {0}")]
    Task(String),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
