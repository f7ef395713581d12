//! Generators for synthetic census-tract data.
//!
//! Everything here is deterministic so tests can assert exact pixels.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use geo::{polygon, Polygon};
use serde_json::{json, Value};
use tile_common::{AttributeValue, BoundingBox, CrsCode, Feature, FeatureCollection};

use crate::fixtures::attrs;

/// Axis-aligned rectangle polygon.
pub fn rect_polygon(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    polygon![
        (x: min_x, y: min_y),
        (x: max_x, y: min_y),
        (x: max_x, y: max_y),
        (x: min_x, y: max_y),
        (x: min_x, y: min_y),
    ]
}

/// A tract feature carrying the usual diversity/integration/population attributes.
pub fn tract(polygon: Polygon<f64>, diversity: f64, integration: f64, population: f64) -> Feature {
    let mut attributes = HashMap::new();
    attributes.insert(attrs::DIVERSITY.to_string(), AttributeValue::Number(diversity));
    attributes.insert(attrs::INTEGRATION.to_string(), AttributeValue::Number(integration));
    attributes.insert(
        attrs::TOTAL_POPULATION.to_string(),
        AttributeValue::Number(population),
    );
    Feature::from_polygon(polygon, attributes)
}

/// Sub-rectangle of `bounds` given in fractions of its width and height.
///
/// `(0, 0)` is the south-west corner.
pub fn fraction_of(bounds: &BoundingBox, fx0: f64, fy0: f64, fx1: f64, fy1: f64) -> Polygon<f64> {
    let w = bounds.width();
    let h = bounds.height();
    rect_polygon(
        bounds.min_x + fx0 * w,
        bounds.min_y + fy0 * h,
        bounds.min_x + fx1 * w,
        bounds.min_y + fy1 * h,
    )
}

/// Two tracts inside one Web Mercator tile.
///
/// The west tract (x in 10%..45% of the tile) is populated with
/// `diversity = integration = 0.4`; the east tract (55%..90%) has zero
/// population and `diversity = integration = 0.8`. Both span 10%..90%
/// vertically.
pub fn two_tract_tile(bounds: &BoundingBox) -> FeatureCollection {
    FeatureCollection::new(
        CrsCode::Epsg3857,
        vec![
            tract(fraction_of(bounds, 0.10, 0.10, 0.45, 0.90), 0.4, 0.4, 1200.0),
            tract(fraction_of(bounds, 0.55, 0.10, 0.90, 0.90), 0.8, 0.8, 0.0),
        ],
    )
}

/// A `cols × rows` grid of lon/lat tracts starting at the south-west corner.
///
/// Diversity cycles through `0.0, 0.1, .. 0.8`; every fifth tract is empty.
pub fn lonlat_tract_grid(
    min_lon: f64,
    min_lat: f64,
    cols: usize,
    rows: usize,
    step: f64,
) -> FeatureCollection {
    let mut features = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            let idx = row * cols + col;
            let x = min_lon + col as f64 * step;
            let y = min_lat + row as f64 * step;
            let diversity = (idx % 9) as f64 / 10.0;
            let population = if idx % 5 == 4 { 0.0 } else { 100.0 * (idx + 1) as f64 };
            features.push(tract(
                rect_polygon(x, y, x + step, y + step),
                diversity,
                0.8 - diversity,
                population,
            ));
        }
    }
    FeatureCollection::new(CrsCode::Epsg4326, features)
}

/// Serialize a collection as a GeoJSON FeatureCollection.
///
/// A named `crs` member is written unless the CRS is EPSG:4326.
pub fn to_geojson(fc: &FeatureCollection) -> Value {
    let features: Vec<Value> = fc
        .features()
        .iter()
        .map(|feature| {
            let polygons: Vec<Value> = feature
                .geometry()
                .0
                .iter()
                .map(|polygon| {
                    let rings: Vec<Vec<[f64; 2]>> = std::iter::once(polygon.exterior())
                        .chain(polygon.interiors())
                        .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
                        .collect();
                    json!(rings)
                })
                .collect();
            let properties: serde_json::Map<String, Value> = feature
                .attributes()
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or(Value::Null)))
                .collect();
            json!({
                "type": "Feature",
                "geometry": { "type": "MultiPolygon", "coordinates": polygons },
                "properties": properties,
            })
        })
        .collect();

    let mut doc = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    if fc.crs() != CrsCode::Epsg4326 {
        doc["crs"] = json!({
            "type": "name",
            "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", fc.crs().epsg()) },
        });
    }
    doc
}

/// Write a collection as GeoJSON into `dir/name`.
pub fn write_geojson(dir: &Path, name: &str, fc: &FeatureCollection) -> PathBuf {
    let path = dir.join(name);
    let text = serde_json::to_string_pretty(&to_geojson(fc)).expect("Failed to serialize GeoJSON");
    std::fs::write(&path, text).expect("Failed to write GeoJSON fixture");
    path
}
