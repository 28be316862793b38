//! Polygon zonal statistics over daily AOD composites.
//!
//! ```text
//! regions.geojson ──► parse_regions ──► Region (region CRS)
//!                                          │ reproject to composite CRS
//! CompositeStore::list ──► read_grid ──► masked_pixels ──► zonal_mean
//!                                                             │
//!                                 TimeSeries (id, date, mean) ◄┘ ──► CSV
//! ```
//!
//! A region that does not overlap a composite, or covers only nodata,
//! yields an absent sample rather than an error.

pub mod config;
pub mod error;
pub mod geojson;
pub mod mask;
pub mod region;
pub mod stats;
pub mod timeseries;

pub use config::ZonalConfig;
pub use error::{Result, ZonalError};
pub use mask::{masked_pixels, PixelWindow};
pub use region::{load_regions, parse_regions, reproject_regions, Polygon, Region};
pub use stats::{zonal_mean, zonal_stats, ZonalStats};
pub use timeseries::{TimeSeries, ZonalEngine, ZonalSample};
