//! Shared test utilities for the tract-tiles workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic census-tract generators
//! - GeoJSON writers for loader and CLI tests
//! - Temporary output directories and file counting
//! - A tolerance assertion for bounding boxes
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
//! use test_utils::{fixtures, two_tract_tile, assert_bbox_approx_eq};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use generators::*;
pub use paths::*;

/// Assert that two values with `min_x/min_y/max_x/max_y` fields agree
/// within `tol` on every edge.
///
/// ```ignore
/// assert_bbox_approx_eq!(feature.bbox().unwrap(), expected, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_bbox_approx_eq {
    ($actual:expr, $expected:expr, $tol:expr) => {{
        let actual = $actual;
        let expected = $expected;
        let tol: f64 = $tol;
        let deltas = [
            actual.min_x - expected.min_x,
            actual.min_y - expected.min_y,
            actual.max_x - expected.max_x,
            actual.max_y - expected.max_y,
        ];
        if deltas.iter().any(|d| d.is_nan() || d.abs() > tol) {
            panic!(
                "bounding boxes differ by more than {}:\n  actual: {:?}\nexpected: {:?}\n  deltas: {:?}",
                tol, actual, expected, deltas
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    use tile_common::BoundingBox;

    #[test]
    fn test_bbox_within_tolerance() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(1e-9, -1e-9, 10.0, 10.0 + 5e-10);
        assert_bbox_approx_eq!(a, b, 1e-6);
    }

    #[test]
    #[should_panic(expected = "bounding boxes differ")]
    fn test_bbox_outside_tolerance() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(0.0, 0.0, 10.1, 10.0);
        assert_bbox_approx_eq!(a, b, 1e-3);
    }

    #[test]
    #[should_panic(expected = "bounding boxes differ")]
    fn test_nan_never_matches() {
        let a = BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0);
        assert_bbox_approx_eq!(a, BoundingBox::new(0.0, 0.0, 1.0, 1.0), 1.0);
    }
}
