//! Parallel composite building across date keys.
//!
//! Each date key is one blocking task on the tokio blocking pool. A
//! semaphore bounds how many run at once, and the key set is deduplicated so
//! no two tasks ever write the same composite.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use aod_common::DateKey;
use futures::stream::{self, StreamExt};
use storage::GranuleScan;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::builder::{CompositeOutcome, DailyCompositeBuilder};
use crate::error::{IngestionError, Result};

/// Per-date results of a scheduling run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildSummary {
    /// Dates that got a new composite.
    pub built: Vec<(DateKey, PathBuf)>,
    /// Dates whose composite already existed.
    pub existing: Vec<DateKey>,
    /// Dates where no granule contributed.
    pub empty: Vec<DateKey>,
    /// Dates that failed, with the error message.
    pub failed: Vec<(DateKey, String)>,
    /// Dated files in the granule directory that are not GeoTIFF.
    pub skipped_files: usize,
}

impl BuildSummary {
    pub fn total(&self) -> usize {
        self.built.len() + self.existing.len() + self.empty.len() + self.failed.len()
    }

    fn record(&mut self, date: DateKey, result: Result<CompositeOutcome>) {
        match result {
            Ok(CompositeOutcome::Written { path, .. }) => self.built.push((date, path)),
            Ok(CompositeOutcome::AlreadyExists(_)) => self.existing.push(date),
            Ok(CompositeOutcome::NoContributions { .. }) => self.empty.push(date),
            Err(e) => {
                error!(date = %date, error = %e, "Composite build failed");
                self.failed.push((date, e.to_string()));
            }
        }
    }

    fn sort(&mut self) {
        self.built.sort();
        self.existing.sort();
        self.empty.sort();
        self.failed.sort();
    }
}

/// Runs the composite builder over many date keys in parallel.
pub struct CompositeScheduler {
    builder: Arc<DailyCompositeBuilder>,
    parallel_dates: usize,
}

impl CompositeScheduler {
    pub fn new(builder: DailyCompositeBuilder, parallel_dates: usize) -> Result<Self> {
        if parallel_dates == 0 {
            return Err(IngestionError::InvalidConfig(
                "parallel_dates must be > 0".to_string(),
            ));
        }
        Ok(Self {
            builder: Arc::new(builder),
            parallel_dates,
        })
    }

    pub fn builder(&self) -> &DailyCompositeBuilder {
        &self.builder
    }

    /// Build composites for every date that has granules.
    pub async fn run_all(&self) -> Result<BuildSummary> {
        let scan = self.builder.source().scan()?;
        let dates = scan.dates();
        Ok(self.run_scan(scan, dates).await)
    }

    /// Build composites for the given dates. Failures of one date never
    /// affect the others.
    pub async fn run(&self, dates: impl IntoIterator<Item = DateKey>) -> Result<BuildSummary> {
        let scan = self.builder.source().scan()?;
        Ok(self.run_scan(scan, dates).await)
    }

    /// Build the given dates from one directory scan.
    async fn run_scan(
        &self,
        scan: GranuleScan,
        dates: impl IntoIterator<Item = DateKey>,
    ) -> BuildSummary {
        let dates: BTreeSet<DateKey> = dates.into_iter().collect();
        info!(
            dates = dates.len(),
            skipped_files = scan.skipped.len(),
            parallel = self.parallel_dates,
            "Starting composite run"
        );

        let skipped_files = scan.skipped.len();
        let mut by_date = scan.by_date;
        let semaphore = Arc::new(Semaphore::new(self.parallel_dates));
        let tasks: Vec<_> = dates
            .into_iter()
            .map(|date| {
                let sem = semaphore.clone();
                let builder = self.builder.clone();
                let granules = by_date.remove(&date).unwrap_or_default();
                async move {
                    let _permit = match sem.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => return (date, Err(IngestionError::Task(e.to_string()))),
                    };
                    let result =
                        tokio::task::spawn_blocking(move || builder.build_from(date, &granules))
                            .await
                            .unwrap_or_else(|e| Err(IngestionError::Task(e.to_string())));
                    (date, result)
                }
            })
            .collect();

        let results: Vec<_> = stream::iter(tasks)
            .buffer_unordered(self.parallel_dates)
            .collect()
            .await;

        let mut summary = BuildSummary {
            skipped_files,
            ..Default::default()
        };
        for (date, result) in results {
            summary.record(date, result);
        }
        summary.sort();

        info!(
            built = summary.built.len(),
            existing = summary.existing.len(),
            empty = summary.empty.len(),
            failed = summary.failed.len(),
            skipped_files = summary.skipped_files,
            "Composite run complete"
        );
        summary
    }
}
