//! Shared test utilities for the AOD composite pipeline workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Temporary pipeline directory layouts
//! - Synthetic grid and granule generators
//! - Common test fixtures (extents, dates, regions)
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{constant_grid, fixtures};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Assert two numbers differ by at most `epsilon`.
///
/// ```ignore
/// assert_approx_eq!(bounds.max_y, 40.0, 0.1);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        if (left - right).abs() > epsilon {
            panic!(
                "assertion failed: {} = {} is not within {} of {}",
                stringify!($left),
                left,
                epsilon,
                right
            );
        }
    }};
}

/// Assert a bounding box matches `(min_x, min_y, max_x, max_y)` within `epsilon`.
#[macro_export]
macro_rules! assert_bounds_approx_eq {
    ($bbox:expr, ($min_x:expr, $min_y:expr, $max_x:expr, $max_y:expr), $epsilon:expr) => {{
        let bbox = $bbox;
        $crate::assert_approx_eq!(bbox.min_x, $min_x, $epsilon);
        $crate::assert_approx_eq!(bbox.min_y, $min_y, $epsilon);
        $crate::assert_approx_eq!(bbox.max_x, $max_x, $epsilon);
        $crate::assert_approx_eq!(bbox.max_y, $max_y, $epsilon);
    }};
}
