//! Reprojection of single-band grids between coordinate systems.

pub mod interpolation;
pub mod reproject;

pub use interpolation::{nearest_index, nearest_interpolate};
pub use reproject::reproject;
