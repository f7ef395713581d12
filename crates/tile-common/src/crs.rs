//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// NAD83 Geographic, used by census TIGER/Line data
    Epsg4269,
    /// Web Mercator (meters), the tile grid projection
    Epsg3857,
    /// CONUS Albers Equal Area
    Epsg5070,
    /// Polar Stereographic North
    Epsg3413,
    /// Polar Stereographic South
    Epsg3031,
    /// Any other EPSG code; parses but has no transform
    Other(u32),
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:4326"
    /// - "CRS:84" (equivalent to EPSG:4326 with lon/lat axis order)
    /// - "urn:ogc:def:crs:EPSG::4269"
    /// - "urn:ogc:def:crs:OGC:1.3:CRS84"
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        if normalized == "CRS:84" || normalized.ends_with(":CRS84") {
            return Ok(CrsCode::Epsg4326);
        }

        let code = normalized
            .strip_prefix("URN:OGC:DEF:CRS:EPSG:")
            .map(|rest| rest.rsplit(':').next().unwrap_or(rest))
            .or_else(|| normalized.strip_prefix("EPSG:"))
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;

        let code: u32 = code
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;

        Ok(Self::from_epsg(code))
    }

    /// Map a numeric EPSG code onto a known variant.
    pub fn from_epsg(code: u32) -> Self {
        match code {
            4326 => CrsCode::Epsg4326,
            4269 => CrsCode::Epsg4269,
            3857 | 900913 => CrsCode::Epsg3857,
            5070 => CrsCode::Epsg5070,
            3413 => CrsCode::Epsg3413,
            3031 => CrsCode::Epsg3031,
            other => CrsCode::Other(other),
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg5070 => 5070,
            CrsCode::Epsg3413 => 3413,
            CrsCode::Epsg3031 => 3031,
            CrsCode::Other(code) => *code,
        }
    }

    /// Check if this is a geographic (lon/lat) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
