//! Common types shared across the AOD composite pipeline crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::{CrsCode, CrsParseError};
pub use error::{GridError, GridResult};
pub use grid::{is_nodata, GeoTransform, Grid, Raster, Sample, SampleType, Samples};
pub use time::DateKey;
