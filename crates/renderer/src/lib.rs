//! Raster rendering for choropleth tile pyramids.
//!
//! - [`colormap`]: named color scales sampled into fixed-size ramps
//! - [`choropleth`]: two-pass polygon fill onto square tiles
//! - [`png`]: indexed/RGBA PNG encoding

pub mod choropleth;
pub mod colormap;
pub mod png;

pub use choropleth::{render_tile, tile_path, write_tile, RasterImage, RenderOptions, ZERO_FLAG_COLOR};
pub use colormap::{build_ramp, registered_names, ColorRamp, Rgb, DEFAULT_SAMPLES};
