//! Temporary directory helpers mirroring the pipeline's on-disk layout.

use std::path::{Path, PathBuf};

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Creates a temporary directory with a specific prefix.
pub fn temp_test_dir_with_prefix(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// Raw and clean data directories laid out under one temporary root.
pub struct PipelineDirs {
    /// Owns the temporary root; dropping it removes everything below.
    pub root: tempfile::TempDir,
    /// Where granules land (`<root>/raw/archives`).
    pub granules: PathBuf,
    /// Where daily composites are written (`<root>/clean/daily_AOD`).
    pub composites: PathBuf,
    /// Where the time-series table goes (`<root>/clean/meanAOD.csv`).
    pub table: PathBuf,
}

impl PipelineDirs {
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }
}

/// Create the granule and composite directories in a fresh temporary root.
pub fn pipeline_dirs() -> PipelineDirs {
    let root = temp_test_dir_with_prefix("aod_pipeline_");
    let granules = root.path().join("raw").join("archives");
    let composites = root.path().join("clean").join("daily_AOD");
    std::fs::create_dir_all(&granules).expect("Failed to create granule dir");
    std::fs::create_dir_all(&composites).expect("Failed to create composite dir");
    let table = root.path().join("clean").join("meanAOD.csv");
    PipelineDirs {
        root,
        granules,
        composites,
        table,
    }
}
