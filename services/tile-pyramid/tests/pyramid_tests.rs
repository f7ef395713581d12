//! End-to-end tests for pyramid rendering.

use std::sync::Mutex;

use test_utils::fixtures::{attrs, bbox, ramps, tiles, ZERO_POPULATION_RGB};
use test_utils::{
    files_with_extension, lonlat_tract_grid, temp_test_dir, tile_path, two_tract_tile,
    write_geojson,
};
use tile_common::{tile_bounds, CrsCode, FeatureCollection, TileCoord, TileError, TileRange, ZeroFlag};
use tile_pyramid::{
    render_pyramid, run, PyramidConfig, PyramidReport, RenderObserver, TileFailure,
    TracingObserver, WrittenTile,
};

// ============================================================================
// Helpers
// ============================================================================

fn nyc_tile() -> FeatureCollection {
    let (z, x, y) = tiles::NYC_Z7;
    two_tract_tile(&tile_bounds(z, x, y).unwrap())
}

/// Records every observer callback.
#[derive(Default)]
struct RecordingObserver {
    started: Mutex<Vec<TileCoord>>,
    empty: Mutex<Vec<TileCoord>>,
    written: Mutex<Vec<WrittenTile>>,
    failed: Mutex<Vec<(TileCoord, Option<String>)>>,
    runs: Mutex<Vec<usize>>,
    finished: Mutex<usize>,
}

impl RenderObserver for RecordingObserver {
    fn run_started(&self, range: &TileRange, _layers: usize) {
        self.runs.lock().unwrap().push(range.len());
    }

    fn tile_started(&self, coord: &TileCoord) {
        self.started.lock().unwrap().push(*coord);
    }

    fn tile_empty(&self, coord: &TileCoord) {
        self.empty.lock().unwrap().push(*coord);
    }

    fn tile_written(&self, tile: &WrittenTile) {
        self.written.lock().unwrap().push(tile.clone());
    }

    fn tile_failed(&self, failure: &TileFailure) {
        self.failed
            .lock()
            .unwrap()
            .push((failure.coord, failure.layer.clone()));
    }

    fn run_finished(&self, _report: &PyramidReport) {
        *self.finished.lock().unwrap() += 1;
    }
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_zoom7_hot_pyramid() {
    let dir = temp_test_dir();
    let (z, x, y) = tiles::NYC_Z7;
    let config = PyramidConfig::new(dir.path()).with_ramp(ramps::HOT);

    let report = run(nyc_tile(), &config, &TracingObserver).unwrap();

    assert!(report.is_success());
    assert_eq!(report.tiles_attempted, 1);
    assert_eq!(report.written.len(), 2);
    assert!(report.empty.is_empty());

    for layer in [attrs::DIVERSITY, attrs::INTEGRATION] {
        let path = tile_path(dir.path(), ramps::HOT, layer, z, x, y);
        assert!(path.exists(), "missing {}", path.display());
        assert!(report.written.iter().any(|t| t.path == path && t.layer == layer));

        let png = image::open(&path).unwrap().to_rgba8();
        assert_eq!(png.dimensions(), (256, 256));
        // west tract: value 0.4 of [0, 0.8]
        assert_eq!(png.get_pixel(70, 128).0, [255, 91, 0, 255]);
        // east tract: zero population
        let [r, g, b] = ZERO_POPULATION_RGB;
        assert_eq!(png.get_pixel(185, 128).0, [r, g, b, 255]);
        assert_eq!(png.get_pixel(2, 2).0[3], 0);
    }

    assert_eq!(files_with_extension(dir.path(), "png").len(), 2);
}

#[test]
fn test_reprojects_lonlat_input() {
    let dir = temp_test_dir();
    let (min_lon, min_lat, _, _) = bbox::MANHATTAN;
    let fc = lonlat_tract_grid(min_lon, min_lat, 3, 3, 0.01);
    assert_eq!(fc.crs(), CrsCode::Epsg4326);

    let config = PyramidConfig::new(dir.path());
    let report = run(fc, &config, &TracingObserver).unwrap();

    let (z, x, y) = tiles::NYC_Z7;
    assert_eq!(report.tiles_attempted, 1);
    assert_eq!(report.written[0].coord, TileCoord::new(z, x, y));
    assert!(tile_path(dir.path(), ramps::DEFAULT, attrs::DIVERSITY, z, x, y).exists());
}

#[test]
fn test_run_from_geojson_file() {
    let dir = temp_test_dir();
    let (min_lon, min_lat, _, _) = bbox::MANHATTAN;
    let input = write_geojson(
        dir.path(),
        "tracts.geojson",
        &lonlat_tract_grid(min_lon, min_lat, 2, 2, 0.01),
    );
    let fc = geojson_parser::read_feature_collection(&input).unwrap();

    let out = dir.path().join("tiles");
    let report = run(fc, &PyramidConfig::new(&out), &TracingObserver).unwrap();
    assert_eq!(report.written.len(), 2);
    assert_eq!(files_with_extension(&out, "png").len(), 2);
}

#[test]
fn test_empty_tiles_write_nothing() {
    let dir = temp_test_dir();
    let (z, x, y) = tiles::NYC_Z7;
    let config = PyramidConfig::new(dir.path()).with_tiles(z, x - 1..=x + 1, y - 1..=y + 1);

    let report = render_pyramid(&nyc_tile(), &config, &TracingObserver).unwrap();

    assert_eq!(report.tiles_attempted, 9);
    assert_eq!(report.empty.len(), 8);
    assert!(!report.empty.contains(&TileCoord::new(z, x, y)));
    assert_eq!(report.written.len(), 2);
    assert_eq!(files_with_extension(dir.path(), "png").len(), 2);
}

#[test]
fn test_zero_flag_disabled() {
    let dir = temp_test_dir();
    let (z, x, y) = tiles::NYC_Z7;
    let mut config = PyramidConfig::new(dir.path()).with_ramp(ramps::HOT);
    config.zero_flag = ZeroFlag::Disabled;

    run(nyc_tile(), &config, &TracingObserver).unwrap();

    let path = tile_path(dir.path(), ramps::HOT, attrs::DIVERSITY, z, x, y);
    let png = image::open(path).unwrap().to_rgba8();
    assert_eq!(png.get_pixel(185, 128).0, [255, 255, 255, 255]);
}

#[test]
fn test_rerun_overwrites() {
    let dir = temp_test_dir();
    let (z, x, y) = tiles::NYC_Z7;
    let config = PyramidConfig::new(dir.path());

    run(nyc_tile(), &config, &TracingObserver).unwrap();
    let path = tile_path(dir.path(), ramps::DEFAULT, attrs::DIVERSITY, z, x, y);
    let first = std::fs::read(&path).unwrap();

    run(nyc_tile(), &config, &TracingObserver).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), first);
    assert_eq!(files_with_extension(dir.path(), "png").len(), 2);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_invalid_tile_reported() {
    let dir = temp_test_dir();
    let (z, x, y) = tiles::INVALID_Z5;
    let config = PyramidConfig::new(dir.path()).with_tiles(z, x - 1..=x, y..=y);

    let report = render_pyramid(&nyc_tile(), &config, &TracingObserver).unwrap();

    assert_eq!(report.tiles_attempted, 2);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.coord, TileCoord::new(z, x, y));
    assert_eq!(failure.layer, None);
    assert!(matches!(
        failure.error,
        TileError::InvalidTileIndex { z: 5, x: 32, y: 0 }
    ));
    // The valid neighbour has no data
    assert_eq!(report.empty, vec![TileCoord::new(z, x - 1, y)]);
}

#[test]
fn test_fail_fast() {
    let dir = temp_test_dir();
    let (z, x, y) = tiles::INVALID_Z5;
    let mut config = PyramidConfig::new(dir.path()).with_tiles(z, x - 1..=x, y..=y);
    config.fail_fast = true;

    let err = render_pyramid(&nyc_tile(), &config, &TracingObserver).unwrap_err();
    assert!(matches!(err, TileError::InvalidTileIndex { z: 5, x: 32, y: 0 }));
}

#[test]
fn test_unknown_ramp_is_fatal() {
    let dir = temp_test_dir();
    let observer = RecordingObserver::default();
    let config = PyramidConfig::new(dir.path()).with_ramp("not_a_ramp");

    let err = run(nyc_tile(), &config, &observer).unwrap_err();
    assert!(err.is_setup_error());
    assert!(matches!(err, TileError::UnknownRamp(name) if name == "not_a_ramp"));
    assert!(observer.started.lock().unwrap().is_empty());
    assert!(files_with_extension(dir.path(), "png").is_empty());
}

#[test]
fn test_explicit_bound_past_data_is_fatal() {
    let dir = temp_test_dir();
    let (_, x, _) = tiles::NYC_Z7;
    let observer = RecordingObserver::default();
    let mut config = PyramidConfig::new(dir.path());
    config.min_x = Some(x + 3);

    let err = run(nyc_tile(), &config, &observer).unwrap_err();
    assert!(err.is_setup_error());
    assert!(matches!(
        err,
        TileError::EmptyTileRange { axis: 'x', min, max } if min == x + 3 && max == x
    ));
    assert!(observer.started.lock().unwrap().is_empty());
    assert!(files_with_extension(dir.path(), "png").is_empty());
}

#[test]
fn test_unsupported_crs_is_fatal() {
    let dir = temp_test_dir();
    let fc = FeatureCollection::new(CrsCode::Other(2263), nyc_tile().features().to_vec());

    let err = run(fc, &PyramidConfig::new(dir.path()), &TracingObserver).unwrap_err();
    assert!(matches!(err, TileError::UnsupportedCrs { .. }));
}

#[test]
fn test_write_failure_collected_per_layer() {
    let dir = temp_test_dir();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let observer = RecordingObserver::default();
    let report = run(nyc_tile(), &PyramidConfig::new(&blocker), &observer).unwrap();

    assert_eq!(report.failures.len(), 2);
    assert!(report.written.is_empty());
    for failure in &report.failures {
        assert!(matches!(failure.error, TileError::Io { .. }));
    }
    let layers: Vec<_> = report.failures.iter().map(|f| f.layer.clone()).collect();
    assert_eq!(
        layers,
        vec![Some(attrs::DIVERSITY.to_string()), Some(attrs::INTEGRATION.to_string())]
    );
    assert_eq!(observer.failed.lock().unwrap().len(), 2);
}

// ============================================================================
// Observer
// ============================================================================

#[test]
fn test_observer_sees_every_tile() {
    let dir = temp_test_dir();
    let (z, x, y) = tiles::NYC_Z7;
    let config = PyramidConfig::new(dir.path()).with_tiles(z, x..=x + 1, y..=y + 1);
    let observer = RecordingObserver::default();

    let report = render_pyramid(&nyc_tile(), &config, &observer).unwrap();

    let mut started = observer.started.lock().unwrap().clone();
    started.sort_by_key(|c| (c.x, c.y));
    assert_eq!(
        started,
        vec![
            TileCoord::new(z, x, y),
            TileCoord::new(z, x, y + 1),
            TileCoord::new(z, x + 1, y),
            TileCoord::new(z, x + 1, y + 1),
        ]
    );
    assert_eq!(observer.empty.lock().unwrap().len(), 3);
    assert_eq!(observer.written.lock().unwrap().len(), report.written.len());
    assert_eq!(*observer.runs.lock().unwrap(), vec![4]);
    assert_eq!(*observer.finished.lock().unwrap(), 1);
}
