//! Pyramid orchestration: clip, render and write every tile in a range.

use std::path::PathBuf;

use projection::reproject;
use rayon::prelude::*;
use renderer::{build_ramp, render_tile, write_tile, ColorRamp};
use tile_common::{clip, CrsCode, FeatureCollection, TileCoord, TileError, TileResult};
use tracing::{debug, info};

use crate::config::PyramidConfig;
use crate::observer::RenderObserver;

/// CRS tiles are cut in.
const TILE_CRS: CrsCode = CrsCode::Epsg3857;

/// One PNG written to the pyramid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTile {
    pub coord: TileCoord,
    pub layer: String,
    pub path: PathBuf,
}

/// A per-tile error. `layer` is `None` when the tile failed before any
/// layer was rendered (e.g. an address outside the grid).
#[derive(Debug)]
pub struct TileFailure {
    pub coord: TileCoord,
    pub layer: Option<String>,
    pub error: TileError,
}

/// Outcome of a pyramid run.
#[derive(Debug, Default)]
pub struct PyramidReport {
    pub tiles_attempted: usize,
    pub written: Vec<WrittenTile>,
    /// Tiles with no intersecting features
    pub empty: Vec<TileCoord>,
    pub failures: Vec<TileFailure>,
}

impl PyramidReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn absorb(&mut self, tile: TileOutcome) {
        self.tiles_attempted += 1;
        if tile.empty {
            self.empty.push(tile.coord);
        }
        self.written.extend(tile.written);
        self.failures.extend(tile.failures);
    }
}

struct TileOutcome {
    coord: TileCoord,
    empty: bool,
    written: Vec<WrittenTile>,
    failures: Vec<TileFailure>,
}

impl TileOutcome {
    fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            empty: false,
            written: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, observer: &dyn RenderObserver, layer: Option<&str>, error: TileError) {
        let failure = TileFailure {
            coord: self.coord,
            layer: layer.map(str::to_string),
            error,
        };
        observer.tile_failed(&failure);
        self.failures.push(failure);
    }
}

/// Reproject a collection into the tiling CRS. Collections already in Web
/// Mercator are returned unchanged.
pub fn prepare(fc: FeatureCollection) -> TileResult<FeatureCollection> {
    if fc.crs() == TILE_CRS {
        return Ok(fc);
    }
    reproject(&fc, TILE_CRS)
}

/// Reproject `fc` into the tiling CRS, then render it.
pub fn run(
    fc: FeatureCollection,
    config: &PyramidConfig,
    observer: &dyn RenderObserver,
) -> TileResult<PyramidReport> {
    // Fail on an unknown ramp before paying for reprojection
    let ramp = build_ramp(&config.ramp, config.samples)?;
    let fc = prepare(fc)?;
    render_with_ramp(&fc, config, &ramp, observer)
}

/// Render every layer of every tile in the configured range.
///
/// Setup errors (unknown ramp, unsupported CRS, zero tile size, an empty
/// tile range) abort before any tile is attempted. Per-tile errors are
/// collected in the report, or returned immediately when
/// `config.fail_fast` is set.
pub fn render_pyramid(
    fc: &FeatureCollection,
    config: &PyramidConfig,
    observer: &dyn RenderObserver,
) -> TileResult<PyramidReport> {
    let ramp = build_ramp(&config.ramp, config.samples)?;
    render_with_ramp(fc, config, &ramp, observer)
}

fn render_with_ramp(
    fc: &FeatureCollection,
    config: &PyramidConfig,
    ramp: &ColorRamp,
    observer: &dyn RenderObserver,
) -> TileResult<PyramidReport> {
    config.options.validate()?;

    let reprojected;
    let fc = if fc.crs() == TILE_CRS {
        fc
    } else {
        reprojected = reproject(fc, TILE_CRS)?;
        &reprojected
    };

    let Some(range) = config.tile_range(fc.total_bounds())? else {
        info!(features = fc.len(), "Nothing to render: no tile range and no data extent");
        let report = PyramidReport::default();
        observer.run_finished(&report);
        return Ok(report);
    };

    observer.run_started(&range, config.layers.len());
    let coords: Vec<TileCoord> = range.iter().collect();

    let outcomes = coords
        .par_iter()
        .map(|&coord| {
            let mut outcome = render_one(fc, coord, config, ramp, observer);
            if config.fail_fast && !outcome.failures.is_empty() {
                return Err(outcome.failures.swap_remove(0).error);
            }
            Ok(outcome)
        })
        .collect::<TileResult<Vec<_>>>()?;

    let mut report = PyramidReport::default();
    for outcome in outcomes {
        report.absorb(outcome);
    }
    observer.run_finished(&report);
    Ok(report)
}

fn render_one(
    fc: &FeatureCollection,
    coord: TileCoord,
    config: &PyramidConfig,
    ramp: &ColorRamp,
    observer: &dyn RenderObserver,
) -> TileOutcome {
    observer.tile_started(&coord);
    let mut outcome = TileOutcome::new(coord);

    let bounds = match coord.bounds() {
        Ok(bounds) => bounds,
        Err(e) => {
            outcome.fail(observer, None, e);
            return outcome;
        }
    };

    let view = clip(fc, &bounds);
    if view.is_empty() {
        outcome.empty = true;
        observer.tile_empty(&coord);
        return outcome;
    }
    debug!(tile = %coord, features = view.len(), "Clipped tile");

    for layer in &config.layers {
        let written = render_tile(&view, layer, ramp, &bounds, &config.zero_flag, &config.options)
            .and_then(|image| write_tile(&image, &config.output_root, &config.ramp, &layer.name, &coord));

        match written {
            Ok(path) => {
                let tile = WrittenTile {
                    coord,
                    layer: layer.name.clone(),
                    path,
                };
                observer.tile_written(&tile);
                outcome.written.push(tile);
            }
            Err(e) => {
                outcome.fail(observer, Some(&layer.name), e);
                if config.fail_fast {
                    break;
                }
            }
        }
    }

    outcome
}
