//! Progress reporting for pyramid runs.
//!
//! The orchestrator never logs tile progress itself; it calls a
//! [`RenderObserver`], which may be invoked concurrently from worker threads.

use tile_common::{TileCoord, TileRange};
use tracing::{debug, info, warn};

use crate::pyramid::{PyramidReport, TileFailure, WrittenTile};

/// Receives pyramid progress events. Every method defaults to a no-op.
pub trait RenderObserver: Send + Sync {
    /// Called once, before any tile, with the tiles about to be attempted.
    fn run_started(&self, _range: &TileRange, _layers: usize) {}

    /// Called for every attempted tile, valid or not.
    fn tile_started(&self, _coord: &TileCoord) {}

    /// No feature intersects the tile; nothing is written.
    fn tile_empty(&self, _coord: &TileCoord) {}

    fn tile_written(&self, _tile: &WrittenTile) {}

    fn tile_failed(&self, _failure: &TileFailure) {}

    fn run_finished(&self, _report: &PyramidReport) {}
}

/// Forwards progress to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RenderObserver for TracingObserver {
    fn run_started(&self, range: &TileRange, layers: usize) {
        info!(
            zoom = range.zoom,
            x = ?range.x,
            y = ?range.y,
            tiles = range.len(),
            layers,
            "Rendering tile pyramid"
        );
    }

    fn tile_empty(&self, coord: &TileCoord) {
        debug!(tile = %coord, "No features in tile, skipping");
    }

    fn tile_written(&self, tile: &WrittenTile) {
        debug!(tile = %tile.coord, layer = %tile.layer, path = %tile.path.display(), "Wrote tile");
    }

    fn tile_failed(&self, failure: &TileFailure) {
        warn!(
            tile = %failure.coord,
            layer = failure.layer.as_deref().unwrap_or("-"),
            error = %failure.error,
            "Tile failed"
        );
    }

    fn run_finished(&self, report: &PyramidReport) {
        info!(
            attempted = report.tiles_attempted,
            written = report.written.len(),
            empty = report.empty.len(),
            failed = report.failures.len(),
            "Tile pyramid complete"
        );
    }
}
