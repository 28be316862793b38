//! Write-once store of daily composites.
//!
//! Layout: one file per date key, `<dir>/<YYYYDDD>_merged.tif`. Files are
//! written to a temporary name in the same directory and then linked into
//! place without replacing an existing composite.

use std::path::{Path, PathBuf};

use aod_common::{DateKey, Grid};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::error::{Result, StorageError};
use crate::geotiff;

const SUFFIX: &str = "_merged.tif";

/// Daily composites on the local filesystem.
#[derive(Debug, Clone)]
pub struct CompositeStore {
    dir: PathBuf,
}

impl CompositeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the composite for `date`, whether or not it exists.
    pub fn path_for(&self, date: DateKey) -> PathBuf {
        self.dir.join(format!("{}{}", date, SUFFIX))
    }

    pub fn exists(&self, date: DateKey) -> bool {
        self.path_for(date).is_file()
    }

    /// Persist the composite for `date` as Int16.
    ///
    /// Fails with [`StorageError::AlreadyExists`] when the date already has a
    /// composite; the existing file is left untouched.
    #[instrument(skip(self, grid), fields(date = %date))]
    pub fn put(&self, date: DateKey, grid: &Grid) -> Result<PathBuf> {
        // A saturated sentinel would collide with clamped valid samples.
        let nodata = grid.nodata.round();
        if !nodata.is_finite() || nodata < i16::MIN as f64 || nodata > i16::MAX as f64 {
            return Err(StorageError::InvalidNodata { value: grid.nodata });
        }
        let target = self.path_for(date);
        if target.exists() {
            return Err(StorageError::AlreadyExists(target));
        }
        std::fs::create_dir_all(&self.dir)?;

        let grid = grid.to_int16();
        let tmp = tempfile::Builder::new()
            .prefix(&format!(".{}", date))
            .suffix(".tif.part")
            .tempfile_in(&self.dir)?;
        geotiff::write_grid(tmp.path(), &grid)?;

        tmp.persist_noclobber(&target).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                StorageError::AlreadyExists(target.clone())
            } else {
                StorageError::Io(e.error)
            }
        })?;

        info!(
            path = %target.display(),
            width = grid.width,
            height = grid.height,
            valid = grid.valid_count(),
            "Stored daily composite"
        );
        Ok(target)
    }

    /// Read the composite for `date`.
    pub fn get(&self, date: DateKey) -> Result<Grid> {
        geotiff::read_grid(&self.path_for(date))
    }

    /// All stored composites as `(date, path)` pairs sorted by date.
    pub fn list(&self) -> Result<Vec<(DateKey, PathBuf)>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !name.ends_with(SUFFIX) {
                continue;
            }
            if let Some(date) = DateKey::from_prefix(name) {
                entries.push((date, entry.into_path()));
            }
        }
        entries.sort();
        debug!(count = entries.len(), "Listed composites");
        Ok(entries)
    }
}
