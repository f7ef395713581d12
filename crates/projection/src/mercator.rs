//! Spherical (Web) Mercator projection.
//!
//! EPSG:3857 treats the WGS84 ellipsoid as a sphere of radius `a`, which
//! makes both directions closed-form.

use std::f64::consts::PI;

/// Sphere radius used by EPSG:3857 (WGS84 semi-major axis, meters).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude at which the projected square ends (degrees).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Project lon/lat degrees to Web Mercator meters.
///
/// Latitude is clamped to ±[`MAX_LATITUDE`] so the poles stay finite.
pub fn forward(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Unproject Web Mercator meters to lon/lat degrees.
pub fn inverse(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}
