//! Coordinate reference system transformations for feature collections.
//!
//! Web Mercator is computed inline; the equal-area and polar projections
//! go through proj4rs.

pub mod mercator;
pub mod reproject;
pub mod transform;

pub use reproject::reproject;
pub use transform::CoordTransformer;
