//! GeoJSON loader for polygon feature collections.
//!
//! Reads RFC 7946 FeatureCollections (plus the pre-RFC named `crs` member
//! that census extracts still carry) into [`tile_common::FeatureCollection`].
//! Only Polygon and MultiPolygon geometries are kept.

mod error;

use std::collections::HashMap;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};
use tile_common::{AttributeValue, CrsCode, Feature, FeatureCollection};
use tracing::{debug, info, warn};

pub use error::{GeoJsonError, GeoJsonResult};

/// CRS assumed when a document has no `crs` member.
pub const DEFAULT_CRS: CrsCode = CrsCode::Epsg4326;

/// Read one GeoJSON file.
pub fn read_feature_collection(path: impl AsRef<Path>) -> GeoJsonResult<FeatureCollection> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| GeoJsonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let fc = parse_feature_collection(&bytes)?;
    info!(
        path = %path.display(),
        features = fc.len(),
        crs = %fc.crs(),
        "Read feature collection"
    );
    Ok(fc)
}

/// Read several GeoJSON files and concatenate them in order.
///
/// All files must share one CRS. An empty list yields an empty collection
/// in [`DEFAULT_CRS`].
pub fn read_feature_files<P: AsRef<Path>>(paths: &[P]) -> GeoJsonResult<FeatureCollection> {
    let mut iter = paths.iter();
    let Some(first) = iter.next() else {
        return Ok(FeatureCollection::new(DEFAULT_CRS, Vec::new()));
    };

    let mut all = read_feature_collection(first)?;
    for path in iter {
        let next = read_feature_collection(path)?;
        all.extend(next).map_err(|found| GeoJsonError::MixedCrs {
            expected: all.crs(),
            found,
            path: path.as_ref().to_path_buf(),
        })?;
    }
    Ok(all)
}

/// Parse a GeoJSON FeatureCollection from bytes.
pub fn parse_feature_collection(bytes: &[u8]) -> GeoJsonResult<FeatureCollection> {
    let value: Value = serde_json::from_slice(bytes)?;

    match value["type"].as_str() {
        Some("FeatureCollection") => {}
        Some(other) => {
            return Err(GeoJsonError::InvalidFormat(format!(
                "expected FeatureCollection, found {}",
                other
            )))
        }
        None => {
            return Err(GeoJsonError::InvalidFormat(
                "missing \"type\" member".to_string(),
            ))
        }
    }

    let crs = parse_crs(&value)?;
    let raw_features = value["features"].as_array().ok_or_else(|| {
        GeoJsonError::InvalidFormat("missing \"features\" array".to_string())
    })?;

    let mut features = Vec::with_capacity(raw_features.len());
    let mut null_geometries = 0usize;
    for (idx, raw) in raw_features.iter().enumerate() {
        let geometry = &raw["geometry"];
        if geometry.is_null() {
            null_geometries += 1;
            continue;
        }

        let Some(geometry) = parse_geometry(geometry, idx)? else {
            continue;
        };
        let attributes = raw["properties"]
            .as_object()
            .map(parse_properties)
            .unwrap_or_default();
        features.push(Feature::new(geometry, attributes));
    }

    if null_geometries > 0 {
        debug!(
            dropped = null_geometries,
            kept = features.len(),
            "Removed features with null geometry"
        );
    }

    Ok(FeatureCollection::new(crs, features))
}

/// CRS from the named-CRS member, defaulting to WGS84.
fn parse_crs(value: &Value) -> GeoJsonResult<CrsCode> {
    match value["crs"]["properties"]["name"].as_str() {
        Some(name) => {
            CrsCode::parse(name).map_err(|_| GeoJsonError::UnsupportedCrs(name.to_string()))
        }
        None => Ok(DEFAULT_CRS),
    }
}

/// Geometry of feature `idx`; `None` for non-polygonal types.
fn parse_geometry(geometry: &Value, idx: usize) -> GeoJsonResult<Option<MultiPolygon<f64>>> {
    let coords = &geometry["coordinates"];
    match geometry["type"].as_str() {
        Some("Polygon") => {
            let polygon = parse_polygon(coords).map_err(|e| at_feature(idx, e))?;
            Ok(Some(MultiPolygon(vec![polygon])))
        }
        Some("MultiPolygon") => {
            let polygons = coords
                .as_array()
                .ok_or_else(|| at_feature(idx, "MultiPolygon coordinates must be an array"))?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| at_feature(idx, e))?;
            Ok(Some(MultiPolygon(polygons)))
        }
        Some(other) => {
            warn!(feature = idx, geometry_type = other, "Skipping non-polygon feature");
            Ok(None)
        }
        None => Err(at_feature(idx, "geometry has no type")),
    }
}

fn at_feature(idx: usize, msg: impl std::fmt::Display) -> GeoJsonError {
    GeoJsonError::InvalidFormat(format!("feature {}: {}", idx, msg))
}

/// `[exterior, hole, hole, ...]`
fn parse_polygon(coords: &Value) -> Result<Polygon<f64>, String> {
    let rings = coords
        .as_array()
        .ok_or("polygon coordinates must be an array")?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next().ok_or("polygon has no exterior ring")??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(ring: &Value) -> Result<LineString<f64>, String> {
    let positions = ring.as_array().ok_or("ring must be an array")?;
    positions
        .iter()
        .map(|position| {
            let x = position.get(0).and_then(Value::as_f64);
            let y = position.get(1).and_then(Value::as_f64);
            match (x, y) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(format!("invalid position {}", position)),
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn parse_properties(properties: &Map<String, Value>) -> HashMap<String, AttributeValue> {
    properties
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Number(n) => n.as_f64().map_or(AttributeValue::Null, AttributeValue::Number),
                Value::String(s) => AttributeValue::Text(s.clone()),
                Value::Bool(b) => AttributeValue::Bool(*b),
                Value::Null | Value::Array(_) | Value::Object(_) => AttributeValue::Null,
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_properties() {
        let props = json!({
            "diversity": 0.42,
            "B03002_001E": 0,
            "NAME": "Tract 1",
            "urban": true,
            "missing": null,
            "nested": {"a": 1},
            "list": [1, 2],
        });
        let attrs = parse_properties(props.as_object().unwrap());
        assert_eq!(attrs["diversity"], AttributeValue::Number(0.42));
        assert_eq!(attrs["B03002_001E"], AttributeValue::Number(0.0));
        assert_eq!(attrs["NAME"], AttributeValue::Text("Tract 1".to_string()));
        assert_eq!(attrs["urban"], AttributeValue::Bool(true));
        assert_eq!(attrs["missing"], AttributeValue::Null);
        assert_eq!(attrs["nested"], AttributeValue::Null);
        assert_eq!(attrs["list"], AttributeValue::Null);
    }

    #[test]
    fn test_polygon_with_hole() {
        let coords = json!([
            [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
            [[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]]
        ]);
        let polygon = parse_polygon(&coords).unwrap();
        assert_eq!(polygon.exterior().0.len(), 5);
        assert_eq!(polygon.interiors().len(), 1);
    }

    #[test]
    fn test_unclosed_ring_is_closed() {
        let coords = json!([[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]);
        let polygon = parse_polygon(&coords).unwrap();
        let ring = &polygon.exterior().0;
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_bad_position() {
        let coords = json!([[[0.0, 0.0], ["a", 1.0], [1.0, 1.0]]]);
        assert!(parse_polygon(&coords).is_err());
        assert!(parse_polygon(&json!([])).is_err());
    }

    #[test]
    fn test_crs_member() {
        let doc = json!({
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4269"}},
            "features": []
        });
        assert_eq!(parse_crs(&doc).unwrap(), CrsCode::Epsg4269);
        assert_eq!(parse_crs(&json!({})).unwrap(), DEFAULT_CRS);

        let bad = json!({"crs": {"properties": {"name": "NAD27 please"}}});
        assert!(matches!(parse_crs(&bad), Err(GeoJsonError::UnsupportedCrs(_))));
    }
}
