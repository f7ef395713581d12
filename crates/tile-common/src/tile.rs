//! Web Mercator tile grid ("slippy map" z/x/y addressing).
//!
//! Column `x` increases eastward and row `y` increases southward from the
//! top-left (north-west) corner of the projected world square.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, TileError, TileResult};

/// Web Mercator world extent (meters).
pub const WEB_MERCATOR_MIN_X: f64 = -20037508.3427892;
pub const WEB_MERCATOR_MIN_Y: f64 = -20037508.3427892;
pub const WEB_MERCATOR_MAX_X: f64 = 20037508.3427892;
pub const WEB_MERCATOR_MAX_Y: f64 = 20037508.3427892;

/// Deepest zoom level the grid supports.
pub const MAX_ZOOM: u32 = 30;

/// The full Web Mercator world square.
pub fn web_mercator_extent() -> BoundingBox {
    BoundingBox::new(
        WEB_MERCATOR_MIN_X,
        WEB_MERCATOR_MIN_Y,
        WEB_MERCATOR_MAX_X,
        WEB_MERCATOR_MAX_Y,
    )
}

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along each axis at this zoom level.
    pub fn matrix_size(z: u32) -> u64 {
        1u64 << z
    }

    /// Whether the address lies inside the global grid.
    pub fn is_valid(&self) -> bool {
        self.z <= MAX_ZOOM
            && u64::from(self.x) < Self::matrix_size(self.z)
            && u64::from(self.y) < Self::matrix_size(self.z)
    }

    /// Path fragment `"{z}/{x}/{y}"`.
    pub fn path_fragment(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }

    /// Get the parent tile (zoom - 1).
    pub fn parent(&self) -> Option<TileCoord> {
        if self.z == 0 {
            return None;
        }
        Some(TileCoord {
            z: self.z - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    /// Get the four children tiles (zoom + 1).
    pub fn children(&self) -> [TileCoord; 4] {
        let x = self.x * 2;
        let y = self.y * 2;
        let z = self.z + 1;
        [
            TileCoord { z, x, y },
            TileCoord { z, x: x + 1, y },
            TileCoord { z, x, y: y + 1 },
            TileCoord {
                z,
                x: x + 1,
                y: y + 1,
            },
        ]
    }

    /// Web Mercator bounds of this tile.
    pub fn bounds(&self) -> TileResult<BoundingBox> {
        tile_bounds(self.z, self.x, self.y)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Compute the Web Mercator bounding box of tile `z/x/y`.
///
/// Both edges are computed from the world origin so that neighbouring tiles
/// share bit-identical boundary coordinates.
pub fn tile_bounds(z: u32, x: u32, y: u32) -> TileResult<BoundingBox> {
    let coord = TileCoord::new(z, x, y);
    if !coord.is_valid() {
        return Err(TileError::InvalidTileIndex { z, x, y });
    }

    let n = TileCoord::matrix_size(z) as f64;
    let tile_span_x = (WEB_MERCATOR_MAX_X - WEB_MERCATOR_MIN_X) / n;
    let tile_span_y = (WEB_MERCATOR_MAX_Y - WEB_MERCATOR_MIN_Y) / n;

    let min_x = WEB_MERCATOR_MIN_X + x as f64 * tile_span_x;
    let max_x = WEB_MERCATOR_MIN_X + (x as f64 + 1.0) * tile_span_x;
    let max_y = WEB_MERCATOR_MAX_Y - y as f64 * tile_span_y;
    let min_y = WEB_MERCATOR_MAX_Y - (y as f64 + 1.0) * tile_span_y;

    Ok(BoundingBox::new(min_x, min_y, max_x, max_y))
}

/// An inclusive rectangle of tile columns and rows at one zoom level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u32,
    pub x: RangeInclusive<u32>,
    pub y: RangeInclusive<u32>,
}

impl TileRange {
    pub fn new(zoom: u32, x: RangeInclusive<u32>, y: RangeInclusive<u32>) -> Self {
        Self { zoom, x, y }
    }

    /// Tiles covering a Web Mercator extent, clamped to the grid.
    ///
    /// Returns `None` when the extent lies entirely outside the world square
    /// or the zoom level is beyond [`MAX_ZOOM`].
    pub fn covering(bounds: &BoundingBox, zoom: u32) -> Option<Self> {
        if zoom > MAX_ZOOM || !bounds.intersects(&web_mercator_extent()) {
            return None;
        }

        let n = TileCoord::matrix_size(zoom);
        let tile_span_x = (WEB_MERCATOR_MAX_X - WEB_MERCATOR_MIN_X) / n as f64;
        let tile_span_y = (WEB_MERCATOR_MAX_Y - WEB_MERCATOR_MIN_Y) / n as f64;
        let last = (n - 1) as f64;

        let col = |x: f64| ((x - WEB_MERCATOR_MIN_X) / tile_span_x).floor().clamp(0.0, last) as u32;
        let row = |y: f64| ((WEB_MERCATOR_MAX_Y - y) / tile_span_y).floor().clamp(0.0, last) as u32;

        Some(Self {
            zoom,
            x: col(bounds.min_x)..=col(bounds.max_x),
            y: row(bounds.max_y)..=row(bounds.min_y),
        })
    }

    /// All tile coordinates in the range, column-major.
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> {
        let zoom = self.zoom;
        let rows = self.y.clone();
        self.x
            .clone()
            .flat_map(move |x| rows.clone().map(move |y| TileCoord::new(zoom, x, y)))
    }

    /// Number of tiles in the range.
    pub fn len(&self) -> usize {
        let span = |r: &RangeInclusive<u32>| {
            if r.is_empty() {
                0
            } else {
                (*r.end() - *r.start()) as usize + 1
            }
        };
        span(&self.x) * span(&self.y)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
