//! Spherical (Web) Mercator projection, EPSG:3857.

use std::f64::consts::PI;

/// Web Mercator on the WGS84 semi-major axis sphere.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    /// Sphere radius (meters)
    pub radius: f64,
}

impl WebMercator {
    /// Latitude where the square Web Mercator world ends.
    pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

    pub fn new() -> Self {
        Self {
            radius: 6_378_137.0,
        }
    }

    /// Geographic degrees to projected meters. Latitudes are clamped to the
    /// Web Mercator limit.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.clamp(-Self::MAX_LATITUDE, Self::MAX_LATITUDE);
        let x = self.radius * lon_deg.to_radians();
        let y = self.radius * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        (x, y)
    }

    /// Projected meters to geographic degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - PI / 2.0).to_degrees();
        (lon, lat)
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let (x, y) = WebMercator::new().forward(0.0, 0.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_world_edge() {
        let proj = WebMercator::new();
        let (x, y) = proj.forward(180.0, WebMercator::MAX_LATITUDE);
        assert!((x - 20037508.342789244).abs() < 1e-3, "x = {}", x);
        assert!((y - 20037508.342789244).abs() < 1e-3, "y = {}", y);
    }

    #[test]
    fn test_roundtrip() {
        let proj = WebMercator::new();
        let (x, y) = proj.forward(-118.25, 34.05);
        let (lon, lat) = proj.inverse(x, y);
        assert!((lon - (-118.25)).abs() < 1e-9);
        assert!((lat - 34.05).abs() < 1e-9);
    }
}
