//! Coordinate reference system transformations.
//!
//! Implements map projections from scratch without external dependencies.
//! Every supported CRS converts to and from geographic lon/lat, and
//! CRS-to-CRS transforms are composed through that pivot.

pub mod error;
pub mod mercator;
pub mod sinusoidal;
pub mod transform;

pub use error::{ProjectionError, Result};
pub use mercator::WebMercator;
pub use sinusoidal::Sinusoidal;
pub use transform::{default_transform, CrsTransform, WarpOutput};
