//! Choropleth rendering of polygon features onto square raster tiles.
//!
//! Each tile is drawn in two passes over the clipped features:
//! 1. every feature with a usable layer value is filled with its ramp color;
//! 2. features whose zero-flag attribute is exactly zero are filled again in
//!    neutral gray, on top of pass 1.
//!
//! There is no background, margin or chrome: undrawn pixels stay
//! transparent.

use std::path::{Path, PathBuf};

use geo::{LineString, MultiPolygon};
use tile_common::{BoundingBox, Feature, FeatureView, RenderLayer, TileCoord, TileError, TileResult, ZeroFlag};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::colormap::{ColorRamp, Rgb};
use crate::png;

/// Fill color for features with zero population.
pub const ZERO_FLAG_COLOR: Rgb = Rgb::from_hex(0xC0C0C0);

/// Default edge length of a tile in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Rasterization options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Tile edge length in pixels
    pub size: u32,
    /// Anti-alias polygon edges
    pub anti_alias: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_TILE_SIZE,
            anti_alias: true,
        }
    }
}

impl RenderOptions {
    pub fn with_size(size: u32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Reject a zero-sized canvas.
    pub fn validate(&self) -> TileResult<()> {
        if self.size == 0 {
            return Err(TileError::InvalidTileSize(self.size));
        }
        Ok(())
    }
}

/// A rendered tile: straight (non-premultiplied) RGBA, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA of pixel `(x, y)`, `y = 0` at the top.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[i..i + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// True when no pixel has any coverage.
    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    pub fn encode_png(&self) -> TileResult<Vec<u8>> {
        png::encode_png(&self.pixels, self.width, self.height)
    }
}

/// Linear map from tile bounds to pixel space, y flipped.
struct Viewport {
    min_x: f64,
    max_y: f64,
    scale_x: f64,
    scale_y: f64,
}

impl Viewport {
    fn new(bounds: &BoundingBox, size: u32) -> TileResult<Self> {
        let (w, h) = (bounds.width(), bounds.height());
        if !(w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite()) {
            return Err(TileError::Render(format!(
                "degenerate tile bounds {:?}",
                bounds
            )));
        }
        Ok(Self {
            min_x: bounds.min_x,
            max_y: bounds.max_y,
            scale_x: size as f64 / w,
            scale_y: size as f64 / h,
        })
    }

    #[inline]
    fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        (
            ((x - self.min_x) * self.scale_x) as f32,
            ((self.max_y - y) * self.scale_y) as f32,
        )
    }

    /// One closed subpath per ring; holes come out via the even-odd rule.
    fn path(&self, geometry: &MultiPolygon<f64>) -> Option<tiny_skia::Path> {
        let mut pb = PathBuilder::new();
        for polygon in &geometry.0 {
            self.push_ring(&mut pb, polygon.exterior());
            for hole in polygon.interiors() {
                self.push_ring(&mut pb, hole);
            }
        }
        pb.finish()
    }

    fn push_ring(&self, pb: &mut PathBuilder, ring: &LineString<f64>) {
        if ring.0.len() < 3 {
            return;
        }
        let mut coords = ring.coords();
        if let Some(first) = coords.next() {
            let (x, y) = self.to_pixel(first.x, first.y);
            pb.move_to(x, y);
        }
        for c in coords {
            let (x, y) = self.to_pixel(c.x, c.y);
            pb.line_to(x, y);
        }
        pb.close();
    }
}

/// Render one layer of one tile.
///
/// Features whose layer value is missing, non-numeric or NaN are skipped
/// in the color pass but still take part in the zero-flag pass.
pub fn render_tile(
    view: &FeatureView<'_>,
    layer: &RenderLayer,
    ramp: &ColorRamp,
    bounds: &BoundingBox,
    zero_flag: &ZeroFlag,
    options: &RenderOptions,
) -> TileResult<RasterImage> {
    options.validate()?;
    let size = options.size;
    let viewport = Viewport::new(bounds, size)?;
    let mut pixmap = Pixmap::new(size, size)
        .ok_or_else(|| TileError::Render(format!("cannot allocate {}x{} pixmap", size, size)))?;

    let mut painted = 0usize;
    for feature in view.iter() {
        if let Some(t) = layer.normalized_value(feature) {
            fill_feature(&mut pixmap, &viewport, feature, ramp.lookup(t), options.anti_alias);
            painted += 1;
        }
    }

    let mut grayed = 0usize;
    if let Some(attribute) = zero_flag.attribute_for(layer) {
        for feature in view.iter() {
            if feature.number(attribute) == Some(0.0) {
                fill_feature(&mut pixmap, &viewport, feature, ZERO_FLAG_COLOR, options.anti_alias);
                grayed += 1;
            }
        }
    }

    tracing::trace!(
        layer = %layer.name,
        features = view.len(),
        painted,
        grayed,
        "Rendered tile layer"
    );

    let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    Ok(RasterImage {
        width: size,
        height: size,
        pixels,
    })
}

fn fill_feature(pixmap: &mut Pixmap, viewport: &Viewport, feature: &Feature, color: Rgb, anti_alias: bool) {
    let Some(path) = viewport.path(feature.geometry()) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = anti_alias;
    pixmap.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
}

/// `{root}/{ramp}/{layer}/{z}/{x}/{y}.png`
pub fn tile_path(root: &Path, ramp_name: &str, layer_name: &str, coord: &TileCoord) -> PathBuf {
    root.join(ramp_name)
        .join(layer_name)
        .join(format!("{}.png", coord.path_fragment()))
}

/// Encode and write a tile, creating parent directories as needed.
pub fn write_tile(
    image: &RasterImage,
    root: &Path,
    ramp_name: &str,
    layer_name: &str,
    coord: &TileCoord,
) -> TileResult<PathBuf> {
    let path = tile_path(root, ramp_name, layer_name, coord);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| TileError::io(dir, e))?;
    }
    let bytes = image.encode_png()?;
    std::fs::write(&path, bytes).map_err(|e| TileError::io(&path, e))?;
    Ok(path)
}
