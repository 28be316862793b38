//! Daily composite ingestion.
//!
//! Turns a directory of raw multi-band AOD granules into one composite per
//! date key.
//!
//! # Architecture
//!
//! ```text
//! GranuleSource::scan()          group files by .AYYYYDDD. code
//!      │
//!      ▼
//! CompositeScheduler::run()      one blocking task per date, bounded
//!      │
//!      ▼
//! DailyCompositeBuilder::build() read → reduce → reproject per granule,
//!      │                         then mosaic the survivors
//!      ▼
//! CompositeStore::put()          <YYYYDDD>_merged.tif, write-once
//! ```

pub mod builder;
pub mod error;
pub mod metadata;
pub mod scheduler;

// Re-exports
pub use builder::{composite_rasters, prepare_granule, CompositeOutcome, DailyCompositeBuilder};
pub use error::{IngestionError, Result};
pub use metadata::{parse_granule_filename, GranuleInfo, TileId};
pub use scheduler::{BuildSummary, CompositeScheduler};
