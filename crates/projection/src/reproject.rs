//! Reprojection of whole feature collections.

use geo::{Coord, MapCoords};
use tile_common::{CrsCode, Feature, FeatureCollection, TileError, TileResult};
use tracing::{debug, info};

use crate::CoordTransformer;

/// Reproject every feature of `fc` into `target`.
///
/// Attributes and feature order are preserved. When the collection is
/// already in `target` the result is a plain copy.
pub fn reproject(fc: &FeatureCollection, target: CrsCode) -> TileResult<FeatureCollection> {
    if fc.crs() == target {
        debug!(crs = %target, "Collection already in target CRS");
        return Ok(fc.clone());
    }

    let transformer = CoordTransformer::new(fc.crs(), target)?;
    info!(
        from = %fc.crs(),
        to = %target,
        features = fc.len(),
        bounds = ?fc.total_bounds(),
        "Reprojecting features"
    );

    let features = fc
        .features()
        .iter()
        .map(|feature| reproject_feature(feature, &transformer))
        .collect::<TileResult<Vec<_>>>()?;

    let out = FeatureCollection::new(target, features);
    info!(bounds = ?out.total_bounds(), "Reprojection complete");
    Ok(out)
}

fn reproject_feature(feature: &Feature, transformer: &CoordTransformer) -> TileResult<Feature> {
    if transformer.is_identity() {
        return Ok(feature.clone());
    }
    let geometry = feature.geometry().try_map_coords(|coord: Coord<f64>| {
        let (x, y) = transformer.transform(coord.x, coord.y)?;
        Ok::<_, TileError>(Coord { x, y })
    })?;
    Ok(feature.with_geometry(geometry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, CoordsIter};
    use std::collections::HashMap;
    use tile_common::{AttributeValue, BoundingBox};

    fn lonlat_square() -> Feature {
        let mut attrs = HashMap::new();
        attrs.insert("GEOID".to_string(), AttributeValue::from("36061000100"));
        Feature::from_polygon(
            polygon![
                (x: -74.0, y: 40.0),
                (x: -73.0, y: 40.0),
                (x: -73.0, y: 41.0),
                (x: -74.0, y: 41.0),
                (x: -74.0, y: 40.0),
            ],
            attrs,
        )
    }

    #[test]
    fn test_reproject_to_mercator() {
        let fc = FeatureCollection::new(CrsCode::Epsg4269, vec![lonlat_square()]);
        let out = reproject(&fc, CrsCode::Epsg3857).unwrap();

        assert_eq!(out.crs(), CrsCode::Epsg3857);
        assert_eq!(out.len(), 1);
        let feature = &out.features()[0];
        assert_eq!(
            feature.attribute("GEOID").and_then(|v| v.as_str()),
            Some("36061000100")
        );

        let (min_x, min_y) = crate::mercator::forward(-74.0, 40.0);
        let (max_x, max_y) = crate::mercator::forward(-73.0, 41.0);
        test_utils::assert_bbox_approx_eq!(
            feature.bbox().unwrap(),
            BoundingBox::new(min_x, min_y, max_x, max_y),
            1e-6
        );
    }

    #[test]
    fn test_same_crs_is_copy() {
        let fc = FeatureCollection::new(CrsCode::Epsg4326, vec![lonlat_square()]);
        let out = reproject(&fc, CrsCode::Epsg4326).unwrap();
        assert_eq!(out.features()[0].bbox(), fc.features()[0].bbox());
    }

    /// Reproject to `via` and back, then compare every vertex.
    fn assert_round_trip(via: CrsCode) {
        let fc = test_utils::lonlat_tract_grid(-74.02, 40.70, 3, 3, 0.01);
        let there = reproject(&fc, via).unwrap();
        assert_eq!(there.crs(), via);
        let back = reproject(&there, CrsCode::Epsg4326).unwrap();

        assert_eq!(back.len(), fc.len());
        for (original, restored) in fc.features().iter().zip(back.features()) {
            let expected: Vec<_> = original.geometry().coords_iter().collect();
            let actual: Vec<_> = restored.geometry().coords_iter().collect();
            assert_eq!(actual.len(), expected.len());
            for (a, e) in actual.iter().zip(&expected) {
                assert!(
                    (a.x - e.x).abs() < 1e-6 && (a.y - e.y).abs() < 1e-6,
                    "{:?} came back as {:?} via {}",
                    e,
                    a,
                    via
                );
            }
        }
    }

    #[test]
    fn test_round_trip_via_mercator() {
        assert_round_trip(CrsCode::Epsg3857);
    }

    #[test]
    fn test_round_trip_via_albers() {
        assert_round_trip(CrsCode::Epsg5070);
    }

    #[test]
    fn test_unsupported_source() {
        let fc = FeatureCollection::new(CrsCode::Other(2263), vec![lonlat_square()]);
        assert!(matches!(
            reproject(&fc, CrsCode::Epsg3857),
            Err(TileError::UnsupportedCrs { .. })
        ));
    }
}
