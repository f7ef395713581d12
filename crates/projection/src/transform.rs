//! Point transforms between the supported coordinate reference systems.
//!
//! Every transform is a two-stage pipeline through geographic lon/lat
//! degrees: the source stage unprojects to lon/lat, the target stage
//! projects from it. NAD83 and WGS84 differ by well under a meter, far
//! below a pixel at any zoom this pipeline renders, so both geographic
//! CRSes share the identity stage.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use tile_common::{CrsCode, TileError, TileResult};

use crate::mercator;

const WGS84_LONLAT: &str = "+proj=longlat +datum=WGS84 +no_defs";
const GRS80_LONLAT: &str = "+proj=longlat +ellps=GRS80 +no_defs";

/// Proj strings for the CRSes that go through proj4rs, paired with the
/// geographic CRS on the same ellipsoid.
fn proj_strings(crs: CrsCode) -> Option<(&'static str, &'static str)> {
    match crs {
        CrsCode::Epsg5070 => Some((
            "+proj=aea +lat_0=23 +lon_0=-96 +lat_1=29.5 +lat_2=45.5 +x_0=0 +y_0=0 +ellps=GRS80 +units=m +no_defs",
            GRS80_LONLAT,
        )),
        CrsCode::Epsg3413 => Some((
            "+proj=stere +lat_0=90 +lat_ts=70 +lon_0=-45 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs",
            WGS84_LONLAT,
        )),
        CrsCode::Epsg3031 => Some((
            "+proj=stere +lat_0=-90 +lat_ts=-71 +lon_0=0 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs",
            WGS84_LONLAT,
        )),
        _ => None,
    }
}

/// One side of the pipeline.
enum Stage {
    Geographic,
    Mercator,
    Proj4 { projected: Proj, geographic: Proj },
}

impl Stage {
    fn for_crs(crs: CrsCode) -> Option<TileResult<Self>> {
        match crs {
            geographic if geographic.is_geographic() => Some(Ok(Stage::Geographic)),
            CrsCode::Epsg3857 => Some(Ok(Stage::Mercator)),
            other => proj_strings(other).map(|(projected, geographic)| {
                let projected = Proj::from_proj_string(projected).map_err(|e| {
                    TileError::Projection(format!("Invalid projection {}: {:?}", other, e))
                })?;
                let geographic = Proj::from_proj_string(geographic).map_err(|e| {
                    TileError::Projection(format!("Invalid projection {}: {:?}", other, e))
                })?;
                Ok(Stage::Proj4 {
                    projected,
                    geographic,
                })
            }),
        }
    }

    fn unproject(&self, x: f64, y: f64) -> TileResult<(f64, f64)> {
        match self {
            Stage::Geographic => Ok((x, y)),
            Stage::Mercator => Ok(mercator::inverse(x, y)),
            Stage::Proj4 {
                projected,
                geographic,
            } => {
                let mut point = (x, y, 0.0);
                transform(projected, geographic, &mut point)
                    .map_err(|e| TileError::Projection(format!("{:?}", e)))?;
                Ok((point.0.to_degrees(), point.1.to_degrees()))
            }
        }
    }

    fn project(&self, lon: f64, lat: f64) -> TileResult<(f64, f64)> {
        match self {
            Stage::Geographic => Ok((lon, lat)),
            Stage::Mercator => Ok(mercator::forward(lon, lat)),
            Stage::Proj4 {
                projected,
                geographic,
            } => {
                let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
                transform(geographic, projected, &mut point)
                    .map_err(|e| TileError::Projection(format!("{:?}", e)))?;
                Ok((point.0, point.1))
            }
        }
    }
}

/// Reusable transformer between two CRSes.
pub struct CoordTransformer {
    from: CrsCode,
    to: CrsCode,
    source: Stage,
    target: Stage,
}

impl std::fmt::Debug for CoordTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordTransformer")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

impl CoordTransformer {
    /// Build a transformer from `from` to `to`.
    ///
    /// # Errors
    /// [`TileError::UnsupportedCrs`] when either side has no known
    /// transform, [`TileError::Projection`] if proj4rs rejects a definition.
    pub fn new(from: CrsCode, to: CrsCode) -> TileResult<Self> {
        let unsupported = || TileError::UnsupportedCrs { from, to };
        let source = Stage::for_crs(from).ok_or_else(unsupported)??;
        let target = Stage::for_crs(to).ok_or_else(unsupported)??;
        Ok(Self {
            from,
            to,
            source,
            target,
        })
    }

    pub fn from_crs(&self) -> CrsCode {
        self.from
    }

    pub fn to_crs(&self) -> CrsCode {
        self.to
    }

    /// True when the transform leaves coordinates untouched.
    pub fn is_identity(&self) -> bool {
        self.from == self.to
            || (matches!(self.source, Stage::Geographic) && matches!(self.target, Stage::Geographic))
    }

    /// Transform a single point.
    pub fn transform(&self, x: f64, y: f64) -> TileResult<(f64, f64)> {
        if self.is_identity() {
            return Ok((x, y));
        }
        let (lon, lat) = self.source.unproject(x, y)?;
        self.target.project(lon, lat)
    }
}
