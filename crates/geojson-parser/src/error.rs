//! Error types for GeoJSON loading.

use std::path::PathBuf;

use thiserror::Error;
use tile_common::CrsCode;

/// Result type for GeoJSON parser operations.
pub type GeoJsonResult<T> = Result<T, GeoJsonError>;

/// Error types for GeoJSON parsing.
#[derive(Error, Debug)]
pub enum GeoJsonError {
    /// File could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bytes are not valid JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON that is not a usable GeoJSON FeatureCollection
    #[error("Invalid GeoJSON: {0}")]
    InvalidFormat(String),

    /// The `crs` member names something we cannot parse
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// Input files disagree on their CRS
    #[error("Mixed CRS in input: {expected} and {found} ({})", path.display())]
    MixedCrs {
        expected: CrsCode,
        found: CrsCode,
        path: PathBuf,
    },
}
