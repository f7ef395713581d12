//! Pyramid run configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use renderer::{RenderOptions, DEFAULT_SAMPLES};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tile_common::{BoundingBox, RenderLayer, TileError, TileRange, TileResult, ZeroFlag};

/// Zoom level rendered when none is given.
pub const DEFAULT_ZOOM: u32 = 7;

/// Color ramp used when none is given.
pub const DEFAULT_RAMP: &str = "Greens";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid layers file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No layers configured")]
    NoLayers,

    #[error("Layer '{0}' is configured more than once")]
    DuplicateLayer(String),

    #[error("Empty {axis} range: {min} > {max}")]
    EmptyRange { axis: char, min: u32, max: u32 },
}

/// Everything a pyramid run needs besides the features themselves.
#[derive(Debug, Clone)]
pub struct PyramidConfig {
    /// Zoom level of the pyramid
    pub zoom: u32,

    /// Tile column bounds (inclusive); missing bounds come from the data extent
    pub min_x: Option<u32>,
    pub max_x: Option<u32>,

    /// Tile row bounds (inclusive); missing bounds come from the data extent
    pub min_y: Option<u32>,
    pub max_y: Option<u32>,

    /// Registered color ramp name, optionally with an `_r` suffix
    pub ramp: String,

    /// Entries sampled from continuous ramps
    pub samples: usize,

    /// Root of the `{ramp}/{layer}/{z}/{x}/{y}.png` tree
    pub output_root: PathBuf,

    /// Layers rendered for every tile
    pub layers: Vec<RenderLayer>,

    /// Gray overlay policy for unpopulated features
    pub zero_flag: ZeroFlag,

    pub options: RenderOptions,

    /// Abort on the first per-tile error instead of collecting it
    pub fail_fast: bool,
}

impl PyramidConfig {
    /// Defaults: zoom 7, `Greens`, the diversity and integration layers.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            min_x: None,
            max_x: None,
            min_y: None,
            max_y: None,
            ramp: DEFAULT_RAMP.to_string(),
            samples: DEFAULT_SAMPLES,
            output_root: output_root.into(),
            layers: RenderLayer::defaults(),
            zero_flag: ZeroFlag::default(),
            options: RenderOptions::default(),
            fail_fast: false,
        }
    }

    /// Pin the tile range explicitly.
    pub fn with_tiles(
        mut self,
        zoom: u32,
        x: std::ops::RangeInclusive<u32>,
        y: std::ops::RangeInclusive<u32>,
    ) -> Self {
        self.zoom = zoom;
        self.min_x = Some(*x.start());
        self.max_x = Some(*x.end());
        self.min_y = Some(*y.start());
        self.max_y = Some(*y.end());
        self
    }

    pub fn with_ramp(mut self, ramp: impl Into<String>) -> Self {
        self.ramp = ramp.into();
        self
    }

    /// Replace the layer list and zero-flag policy from a layers file.
    pub fn apply_layers_file(&mut self, file: LayersFile) {
        if let Some(attribute) = file.zero_flag_attribute {
            self.zero_flag = ZeroFlag::Attribute(attribute);
        }
        self.layers = file.layers;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layers.is_empty() {
            return Err(ConfigError::NoLayers);
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.name.as_str()) {
                return Err(ConfigError::DuplicateLayer(layer.name.clone()));
            }
        }

        for (axis, min, max) in [('x', self.min_x, self.max_x), ('y', self.min_y, self.max_y)] {
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err(ConfigError::EmptyRange { axis, min, max });
                }
            }
        }
        Ok(())
    }

    /// Tiles to attempt.
    ///
    /// Explicit bounds are used as given, even outside the grid; the rest
    /// come from the tiles covering `extent`. `Ok(None)` when a bound is
    /// missing and there is no usable extent. A derived bound can land on
    /// the wrong side of an explicit one, which is an error.
    pub fn tile_range(&self, extent: Option<BoundingBox>) -> TileResult<Option<TileRange>> {
        let covering = extent.and_then(|bounds| TileRange::covering(&bounds, self.zoom));
        let covered = |explicit: Option<u32>, derived: fn(&TileRange) -> u32| {
            explicit.or_else(|| covering.as_ref().map(derived))
        };

        let bounds = (
            covered(self.min_x, |r| *r.x.start()),
            covered(self.max_x, |r| *r.x.end()),
            covered(self.min_y, |r| *r.y.start()),
            covered(self.max_y, |r| *r.y.end()),
        );
        let (Some(min_x), Some(max_x), Some(min_y), Some(max_y)) = bounds else {
            return Ok(None);
        };

        for (axis, min, max) in [('x', min_x, max_x), ('y', min_y, max_y)] {
            if min > max {
                return Err(TileError::EmptyTileRange { axis, min, max });
            }
        }
        Ok(Some(TileRange::new(self.zoom, min_x..=max_x, min_y..=max_y)))
    }
}

/// YAML layer configuration.
///
/// ```yaml
/// zero_flag_attribute: B03002_001E
/// layers:
///   - name: diversity
///     vmin: 0.0
///     vmax: 0.8
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayersFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero_flag_attribute: Option<String>,
    pub layers: Vec<RenderLayer>,
}

impl LayersFile {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::from_yaml_str(&yaml)?;
        tracing::debug!(path = %path.display(), layers = file.layers.len(), "Loaded layers file");
        Ok(file)
    }
}
