//! Per-tile spatial filtering.
//!
//! Features are kept or dropped whole by bounding-box intersection; the
//! rasterizer crops anything outside the tile at the pixel level.

use crate::{BoundingBox, FeatureCollection, FeatureView};

/// Features whose bounding box intersects `bounds` (edges inclusive), in
/// input order.
pub fn clip<'a>(fc: &'a FeatureCollection, bounds: &BoundingBox) -> FeatureView<'a> {
    let features = fc
        .features()
        .iter()
        .filter(|feature| {
            feature
                .bbox()
                .is_some_and(|bbox| bbox.intersects(bounds))
        })
        .collect();

    FeatureView::new(fc.crs(), features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttributeValue, CrsCode, Feature};
    use geo::{polygon, MultiPolygon};
    use std::collections::HashMap;

    fn tagged_square(id: &str, x0: f64, y0: f64, size: f64) -> Feature {
        let mut attributes = HashMap::new();
        attributes.insert("GEOID".to_string(), AttributeValue::from(id));
        Feature::from_polygon(
            polygon![
                (x: x0, y: y0),
                (x: x0 + size, y: y0),
                (x: x0 + size, y: y0 + size),
                (x: x0, y: y0 + size),
                (x: x0, y: y0),
            ],
            attributes,
        )
    }

    fn ids(view: &FeatureView<'_>) -> Vec<String> {
        view.iter()
            .filter_map(|f| f.attribute("GEOID").and_then(|v| v.as_str()).map(String::from))
            .collect()
    }

    #[test]
    fn test_clip_keeps_intersecting_in_order() {
        let fc = FeatureCollection::new(
            CrsCode::Epsg3857,
            vec![
                tagged_square("c", 8.0, 8.0, 4.0),
                tagged_square("far", 100.0, 100.0, 1.0),
                tagged_square("a", 1.0, 1.0, 2.0),
                tagged_square("b", -5.0, -5.0, 6.0),
            ],
        );
        let view = clip(&fc, &BoundingBox::new(0.0, 0.0, 10.0, 10.0));

        assert_eq!(ids(&view), vec!["c", "a", "b"]);
        assert_eq!(view.crs(), CrsCode::Epsg3857);
        assert_eq!(fc.len(), 4);
    }

    #[test]
    fn test_clip_edges_inclusive() {
        let fc = FeatureCollection::new(
            CrsCode::Epsg3857,
            vec![
                tagged_square("left", -2.0, 0.0, 2.0),
                tagged_square("corner", 10.0, 10.0, 1.0),
                tagged_square("gap", 10.5, 0.0, 1.0),
            ],
        );
        let view = clip(&fc, &BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(ids(&view), vec!["left", "corner"]);
    }

    #[test]
    fn test_clip_drops_empty_geometry() {
        let fc = FeatureCollection::new(
            CrsCode::Epsg3857,
            vec![Feature::new(MultiPolygon(vec![]), HashMap::new())],
        );
        assert!(clip(&fc, &BoundingBox::new(-1e9, -1e9, 1e9, 1e9)).is_empty());
    }
}
