//! Tests for BoundingBox and the clipping built on it.

use std::collections::HashMap;

use geo::{polygon, MultiPolygon};
use tile_common::bbox::BoundingBox;
use tile_common::{clip, tile_bounds, AttributeValue, CrsCode, Feature, FeatureCollection};

fn square(x0: f64, y0: f64, size: f64, id: &str) -> Feature {
    let mut attrs = HashMap::new();
    attrs.insert("GEOID".to_string(), AttributeValue::from(id));
    Feature::from_polygon(
        polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ],
        attrs,
    )
}

fn ids(view: &tile_common::FeatureView<'_>) -> Vec<String> {
    view.iter()
        .filter_map(|f| f.attribute("GEOID").and_then(|v| v.as_str()).map(str::to_string))
        .collect()
}

// ============================================================================
// Dimensions
// ============================================================================

#[test]
fn test_bbox_width_negative_coords() {
    let bbox = BoundingBox::new(-100.0, 0.0, -50.0, 10.0);
    assert_eq!(bbox.width(), 50.0);
    assert_eq!(bbox.height(), 10.0);
}

#[test]
fn test_bbox_zero_dimensions() {
    let bbox = BoundingBox::new(5.0, 5.0, 5.0, 5.0);
    assert_eq!(bbox.width(), 0.0);
    assert!(bbox.intersects(&bbox));
}

// ============================================================================
// Intersection
// ============================================================================

#[test]
fn test_bbox_intersects_just_past_edge() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(10.000001, 0.0, 20.0, 10.0);
    assert!(!a.intersects(&b));
    assert!(!b.intersects(&a));
}

#[test]
fn test_bbox_intersects_contains() {
    let outer = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
    let inner = BoundingBox::new(25.0, 25.0, 75.0, 75.0);
    assert!(outer.intersects(&inner));
    assert!(inner.intersects(&outer));
}

#[test]
fn test_neighbouring_tiles_touch() {
    let tile = tile_bounds(7, 37, 48).unwrap();
    let east = tile_bounds(7, 38, 48).unwrap();
    let south_east = tile_bounds(7, 38, 49).unwrap();
    let far = tile_bounds(7, 39, 48).unwrap();

    assert!(tile.intersects(&east));
    assert!(tile.intersects(&south_east));
    assert!(!tile.intersects(&far));
}

#[test]
fn test_union_is_order_independent() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(-5.0, 2.0, 3.0, 30.0);
    let c = BoundingBox::new(4.0, -8.0, 6.0, -7.0);
    assert_eq!(a.union(&b), BoundingBox::new(-5.0, 0.0, 10.0, 30.0));
    assert_eq!(a.union(&b).union(&c), c.union(&b).union(&a));
}

// ============================================================================
// Clipping
// ============================================================================

#[test]
fn test_clip_keeps_order_and_edges() {
    let fc = FeatureCollection::new(
        CrsCode::Epsg3857,
        vec![
            square(20.0, 20.0, 5.0, "outside"),
            square(8.0, 8.0, 4.0, "overlap"),
            square(10.0, 0.0, 3.0, "edge"),
            square(2.0, 2.0, 1.0, "inside"),
        ],
    );
    let bounds = BoundingBox::new(0.0, 0.0, 10.0, 10.0);

    let view = clip(&fc, &bounds);
    assert_eq!(view.crs(), CrsCode::Epsg3857);
    assert_eq!(ids(&view), vec!["overlap", "edge", "inside"]);
    // Input untouched
    assert_eq!(fc.len(), 4);
}

#[test]
fn test_clip_drops_empty_geometry() {
    let fc = FeatureCollection::new(
        CrsCode::Epsg3857,
        vec![Feature::new(MultiPolygon(vec![]), HashMap::new())],
    );
    let world = BoundingBox::new(-1e9, -1e9, 1e9, 1e9);
    assert!(clip(&fc, &world).is_empty());
}
