//! Render layer definitions.

use serde::{Deserialize, Serialize};

use crate::Feature;

/// Attribute used by the census extracts for total population.
pub const DEFAULT_POPULATION_ATTRIBUTE: &str = "B03002_001E";

/// A numeric attribute rendered as one choropleth layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderLayer {
    /// Attribute name; also the layer's directory name in the pyramid
    pub name: String,
    /// Value mapped to the first ramp entry
    pub vmin: f64,
    /// Value mapped to the last ramp entry
    pub vmax: f64,
    /// Per-layer override of the run-wide zero-flag attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero_flag_attribute: Option<String>,
}

impl RenderLayer {
    pub fn new(name: impl Into<String>, vmin: f64, vmax: f64) -> Self {
        Self {
            name: name.into(),
            vmin,
            vmax,
            zero_flag_attribute: None,
        }
    }

    /// Linear normalization of `value` into [0, 1].
    ///
    /// A degenerate range maps everything to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.vmax - self.vmin;
        if range == 0.0 || !range.is_finite() {
            return 0.0;
        }
        ((value - self.vmin) / range).clamp(0.0, 1.0)
    }

    /// Normalized attribute value of a feature, if it has a usable one.
    pub fn normalized_value(&self, feature: &Feature) -> Option<f64> {
        feature
            .number(&self.name)
            .filter(|v| !v.is_nan())
            .map(|v| self.normalize(v))
    }

    /// The two layers the diversity/integration map publishes.
    pub fn defaults() -> Vec<RenderLayer> {
        vec![
            RenderLayer::new("diversity", 0.0, 0.8),
            RenderLayer::new("integration", 0.0, 0.8),
        ]
    }
}

/// Policy for the neutral-gray "no population" overlay pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroFlag {
    /// No overlay pass
    Disabled,
    /// Gray out features whose attribute equals exactly zero
    Attribute(String),
}

impl Default for ZeroFlag {
    fn default() -> Self {
        ZeroFlag::Attribute(DEFAULT_POPULATION_ATTRIBUTE.to_string())
    }
}

impl ZeroFlag {
    /// Attribute checked for `layer`, honoring the layer's override.
    pub fn attribute_for<'a>(&'a self, layer: &'a RenderLayer) -> Option<&'a str> {
        match (&layer.zero_flag_attribute, self) {
            (Some(name), _) => Some(name.as_str()),
            (None, ZeroFlag::Attribute(name)) => Some(name.as_str()),
            (None, ZeroFlag::Disabled) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_clamps() {
        let layer = RenderLayer::new("diversity", 0.0, 0.8);
        assert_eq!(layer.normalize(0.0), 0.0);
        assert!((layer.normalize(0.4) - 0.5).abs() < 1e-12);
        assert_eq!(layer.normalize(0.8), 1.0);
        assert_eq!(layer.normalize(2.0), 1.0);
        assert_eq!(layer.normalize(-1.0), 0.0);
    }

    #[test]
    fn test_degenerate_range() {
        let layer = RenderLayer::new("flat", 1.0, 1.0);
        assert_eq!(layer.normalize(5.0), 0.0);
    }

    #[test]
    fn test_zero_flag_override() {
        let mut layer = RenderLayer::new("integration", 0.0, 0.8);
        let policy = ZeroFlag::default();
        assert_eq!(policy.attribute_for(&layer), Some(DEFAULT_POPULATION_ATTRIBUTE));
        assert_eq!(ZeroFlag::Disabled.attribute_for(&layer), None);

        layer.zero_flag_attribute = Some("total".to_string());
        assert_eq!(policy.attribute_for(&layer), Some("total"));
        assert_eq!(ZeroFlag::Disabled.attribute_for(&layer), Some("total"));
    }
}
