//! Common types and utilities shared across the tract-tiles crates.

pub mod bbox;
pub mod clip;
pub mod crs;
pub mod error;
pub mod feature;
pub mod layer;
pub mod tile;

pub use bbox::BoundingBox;
pub use clip::clip;
pub use crs::CrsCode;
pub use error::{TileError, TileResult};
pub use feature::{AttributeValue, Feature, FeatureCollection, FeatureView};
pub use layer::{RenderLayer, ZeroFlag};
pub use tile::{tile_bounds, TileCoord, TileRange};
