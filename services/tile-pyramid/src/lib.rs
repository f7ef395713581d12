//! Choropleth tile pyramid generation.
//!
//! Reprojects a census tract collection to Web Mercator once, then renders
//! every configured layer of every tile in a z/x/y range to
//! `{output_root}/{ramp}/{layer}/{z}/{x}/{y}.png`.

pub mod config;
pub mod observer;
pub mod pyramid;

pub use config::{ConfigError, LayersFile, PyramidConfig, DEFAULT_RAMP, DEFAULT_ZOOM};
pub use observer::{RenderObserver, TracingObserver};
pub use pyramid::{prepare, render_pyramid, run, PyramidReport, TileFailure, WrittenTile};
