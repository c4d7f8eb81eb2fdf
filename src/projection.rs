//! Grid cell to longitude/latitude projection.
//!
//! One cell is one meter. Offsets are converted to degrees on a sphere of the
//! WGS84 equatorial radius, with longitude scaled at the origin latitude.

use std::f64::consts::PI;

/// Earth equatorial radius (meters)
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Converts grid cell offsets to geographic coordinates.
pub trait CoordinateProjector: Send + Sync {
    /// Project cell `(x, y)` relative to the grid origin to `(lon, lat)`.
    fn cell_to_lon_lat(&self, x: f64, y: f64, origin_lon: f64, origin_lat: f64) -> (f64, f64);
}

/// Local flat-earth projection around the grid origin.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetricProjector;

impl CoordinateProjector for MetricProjector {
    fn cell_to_lon_lat(&self, x: f64, y: f64, origin_lon: f64, origin_lat: f64) -> (f64, f64) {
        let lon = origin_lon + meters_to_lon_degrees(x, origin_lat);
        let lat = origin_lat + meters_to_lat_degrees(y);
        (lon, lat)
    }
}

pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    (meters / EARTH_RADIUS) * (180.0 / PI)
}

pub fn meters_to_lon_degrees(meters: f64, at_lat: f64) -> f64 {
    (meters / (EARTH_RADIUS * (at_lat * PI / 180.0).cos())) * (180.0 / PI)
}
