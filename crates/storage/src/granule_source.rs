//! Discovery of raw granule files on disk.
//!
//! Granules are GeoTIFFs whose names embed the acquisition date as
//! `.AYYYYDDD.`, e.g. `MCD19A2.A2024015.h08v05.061.2024017010203.tif`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use aod_common::DateKey;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::error::Result;

/// One raw granule file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Granule {
    pub path: PathBuf,
    /// Date the scene was captured.
    pub date: DateKey,
    /// Position among the granules of the same date, in filename order.
    pub scene: usize,
}

impl Granule {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Result of one directory scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GranuleScan {
    /// Granules grouped by date key, scenes in filename order.
    pub by_date: BTreeMap<DateKey, Vec<Granule>>,
    /// Files that carry a date code but are not GeoTIFF (e.g. HDF-EOS
    /// downloads awaiting conversion).
    pub skipped: Vec<PathBuf>,
}

impl GranuleScan {
    /// Sorted distinct date keys that have at least one granule.
    pub fn dates(&self) -> Vec<DateKey> {
        self.by_date.keys().copied().collect()
    }

    /// Granules captured on `date`, possibly none.
    pub fn granules(&self, date: DateKey) -> &[Granule] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

/// A directory of granule files.
#[derive(Debug, Clone)]
pub struct GranuleSource {
    dir: PathBuf,
}

impl GranuleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Group every granule in the directory by date key.
    ///
    /// A missing directory holds no granules. Dated files in another format
    /// are listed in [`GranuleScan::skipped`] and reported at `warn`.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn scan(&self) -> Result<GranuleScan> {
        let mut by_date: BTreeMap<DateKey, Vec<PathBuf>> = BTreeMap::new();
        let mut skipped = Vec::new();

        if !self.dir.is_dir() {
            debug!("Granule directory does not exist");
            return Ok(GranuleScan::default());
        }

        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if let Some(date) = granule_date(name) {
                by_date.entry(date).or_default().push(entry.into_path());
            } else if DateKey::find_in_filename(name).is_some() {
                skipped.push(entry.into_path());
            }
        }

        let grouped: BTreeMap<_, _> = by_date
            .into_iter()
            .map(|(date, mut paths)| {
                paths.sort();
                let granules = paths
                    .into_iter()
                    .enumerate()
                    .map(|(scene, path)| Granule { path, date, scene })
                    .collect();
                (date, granules)
            })
            .collect();

        skipped.sort();
        if let Some(first) = skipped.first() {
            warn!(
                skipped = skipped.len(),
                example = %first.display(),
                "Dated files are not GeoTIFF and were skipped; convert them to GeoTIFF first"
            );
        }

        debug!(dates = grouped.len(), "Scanned granules");
        Ok(GranuleScan {
            by_date: grouped,
            skipped,
        })
    }

    /// Sorted distinct date keys that have at least one granule.
    pub fn dates(&self) -> Result<Vec<DateKey>> {
        Ok(self.scan()?.dates())
    }
}

/// Date key of a granule filename, `None` for files that are not granules.
pub fn granule_date(name: &str) -> Option<DateKey> {
    let lower = name.to_ascii_lowercase();
    if !(lower.ends_with(".tif") || lower.ends_with(".tiff")) {
        return None;
    }
    DateKey::find_in_filename(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granule_date() {
        let key = granule_date("MCD19A2.A2019296.h08v05.006.2019298034512.tif").unwrap();
        assert_eq!(key.to_string(), "2019296");
        assert!(granule_date("MCD19A2.A2019296.h08v05.006.2019298034512.hdf").is_none());
        assert!(granule_date("notes.tif").is_none());
        assert!(granule_date("MCD19A2.A2019400.h08v05.tif").is_none());
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let source = GranuleSource::new("/nonexistent/granules");
        assert!(source.scan().unwrap().is_empty());
        assert!(source.scan().unwrap().skipped.is_empty());
    }
}
