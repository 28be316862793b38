//! Raster operations behind the daily AOD composite.
//!
//! Each raw granule goes through three steps before it can join a daily
//! composite:
//!
//! # Architecture
//!
//! ```text
//! Raster (N overpass bands, native CRS)
//!      │
//!      ▼
//! reduce_bands()      per-pixel mean of valid bands
//!      │
//!      ▼
//! reproject(target)   nearest-neighbor warp, skipped when CRS already matches
//!      │
//!      ▼
//! mosaic(policy)      union extent, first valid value wins by default
//!      │
//!      ▼
//! Grid (one band, target CRS)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{mosaic, reduce_bands, reproject, MergePolicy};
//!
//! let reduced = rasters.iter().map(reduce_bands).collect::<Result<Vec<_>, _>>()?;
//! let warped = reduced
//!     .iter()
//!     .map(|g| reproject(g, CrsCode::Epsg4326))
//!     .collect::<Result<Vec<_>, _>>()?;
//! let composite = mosaic(&warped, MergePolicy::First)?;
//! ```

pub mod config;
pub mod error;
pub mod mosaic;
pub mod projection;
pub mod reduce;

// Re-export commonly used types at crate root
pub use config::{CompositeConfig, MergePolicy};
pub use error::{GridProcessorError, Result};
pub use mosaic::mosaic;
pub use projection::reproject;
pub use reduce::reduce_bands;
