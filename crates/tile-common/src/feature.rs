//! Vector features: polygon geometry plus named attributes.

use std::collections::HashMap;

use geo::{BoundingRect, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::{BoundingBox, CrsCode};

/// A single attribute value carried by a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl AttributeValue {
    /// Numeric view of the value.
    ///
    /// Text that parses as a number (e.g. `"0"`, `"0.25"`) is accepted, since
    /// census extracts frequently carry counts as strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(v) => Some(*v),
            AttributeValue::Text(s) => s.trim().parse().ok(),
            AttributeValue::Bool(_) | AttributeValue::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Number(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

/// One polygonal feature.
///
/// The bounding box is computed once at construction; features are
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct Feature {
    geometry: MultiPolygon<f64>,
    attributes: HashMap<String, AttributeValue>,
    bbox: Option<BoundingBox>,
}

impl Feature {
    pub fn new(geometry: MultiPolygon<f64>, attributes: HashMap<String, AttributeValue>) -> Self {
        let bbox = geometry.bounding_rect().map(BoundingBox::from);
        Self {
            geometry,
            attributes,
            bbox,
        }
    }

    /// Build a feature from a single polygon.
    pub fn from_polygon(polygon: Polygon<f64>, attributes: HashMap<String, AttributeValue>) -> Self {
        Self::new(MultiPolygon(vec![polygon]), attributes)
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Numeric value of an attribute, if present and numeric.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(AttributeValue::as_f64)
    }

    /// Bounding box of the geometry; `None` for empty geometry.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.bbox
    }

    /// Same attributes, new geometry. Used by reprojection.
    pub fn with_geometry(&self, geometry: MultiPolygon<f64>) -> Self {
        Self::new(geometry, self.attributes.clone())
    }
}

/// An ordered set of features sharing one CRS.
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    crs: CrsCode,
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(crs: CrsCode, features: Vec<Feature>) -> Self {
        Self { crs, features }
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Union of all feature bounding boxes.
    pub fn total_bounds(&self) -> Option<BoundingBox> {
        self.features
            .iter()
            .filter_map(Feature::bbox)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Borrowed view over every feature.
    pub fn view(&self) -> FeatureView<'_> {
        FeatureView {
            crs: self.crs,
            features: self.features.iter().collect(),
        }
    }

    /// Append another collection's features. CRSes must match.
    pub fn extend(&mut self, other: FeatureCollection) -> Result<(), CrsCode> {
        if other.crs != self.crs {
            return Err(other.crs);
        }
        self.features.extend(other.features);
        Ok(())
    }
}

/// A transient, order-preserving subset of a collection.
#[derive(Debug, Clone)]
pub struct FeatureView<'a> {
    crs: CrsCode,
    features: Vec<&'a Feature>,
}

impl<'a> FeatureView<'a> {
    pub fn new(crs: CrsCode, features: Vec<&'a Feature>) -> Self {
        Self { crs, features }
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn features(&self) -> &[&'a Feature] {
        &self.features
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Feature> + '_ {
        self.features.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn total_bounds(&self) -> Option<BoundingBox> {
        self.iter()
            .filter_map(Feature::bbox)
            .reduce(|acc, b| acc.union(&b))
    }
}
