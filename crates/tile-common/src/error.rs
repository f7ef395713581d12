//! Error types for the tile pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::CrsCode;

/// Result type alias using TileError.
pub type TileResult<T> = Result<T, TileError>;

/// Primary error type for tile pyramid operations.
#[derive(Debug, Error)]
pub enum TileError {
    // === Setup Errors ===
    #[error("Unknown color ramp: {0}")]
    UnknownRamp(String),

    #[error("Unsupported CRS transform: {from} -> {to}")]
    UnsupportedCrs { from: CrsCode, to: CrsCode },

    #[error("Invalid tile size: {0} (must be > 0)")]
    InvalidTileSize(u32),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Empty tile {axis} range: {min} > {max}")]
    EmptyTileRange { axis: char, min: u32, max: u32 },

    // === Per-Tile Errors ===
    #[error("Invalid tile index {z}/{x}/{y}: column and row must be < 2^{z}")]
    InvalidTileIndex { z: u32, x: u32, y: u32 },

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TileError {
    /// Whether this error aborts a run before any tile is processed.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            TileError::UnknownRamp(_)
                | TileError::UnsupportedCrs { .. }
                | TileError::InvalidTileSize(_)
                | TileError::Projection(_)
                | TileError::EmptyTileRange { .. }
        )
    }

    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TileError::Io {
            path: path.into(),
            source,
        }
    }
}
