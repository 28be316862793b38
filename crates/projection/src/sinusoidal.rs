//! Sinusoidal equal-area projection.
//!
//! MODIS land products (including the MCD19A2 aerosol granules) are
//! delivered on a 10°x10° tile grid in a sinusoidal projection on a sphere
//! of radius 6 371 007.181 m, central meridian 0.

use aod_common::crs::MODIS_SPHERE_RADIUS;

/// Sinusoidal projection parameters.
#[derive(Debug, Clone, Copy)]
pub struct Sinusoidal {
    /// Sphere radius (meters)
    pub radius: f64,
    /// Central meridian (degrees)
    pub central_meridian: f64,
}

impl Sinusoidal {
    pub fn new(radius: f64, central_meridian: f64) -> Self {
        Self {
            radius,
            central_meridian,
        }
    }

    /// The MODIS tile grid sphere.
    pub fn modis() -> Self {
        Self::new(MODIS_SPHERE_RADIUS, 0.0)
    }

    /// Geographic degrees to projected meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let dlon = (lon_deg - self.central_meridian).to_radians();
        (self.radius * dlon * lat.cos(), self.radius * lat)
    }

    /// Projected meters to geographic degrees.
    ///
    /// Returns `None` for points in the empty corners of the projection,
    /// where the longitude would fall outside ±180° of the central meridian.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let lat = y / self.radius;
        if lat.abs() > std::f64::consts::FRAC_PI_2 + 1e-12 {
            return None;
        }
        let cos_lat = lat.cos();
        let dlon = if cos_lat.abs() < 1e-12 {
            if x.abs() > 1e-6 {
                return None;
            }
            0.0
        } else {
            x / (self.radius * cos_lat)
        };
        if dlon.abs() > std::f64::consts::PI + 1e-12 {
            return None;
        }
        Some((self.central_meridian + dlon.to_degrees(), lat.to_degrees()))
    }
}

impl Default for Sinusoidal {
    fn default() -> Self {
        Self::modis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modis_tile_h08v05_corner() {
        // Upper-left corner of MODIS tile h08v05 (40°N, 10 tiles of 1111950.5197 m).
        let proj = Sinusoidal::modis();
        let tile = 1_111_950.519_666_7;
        let x = -20_015_109.354 + 8.0 * tile;
        let y = 10_007_554.677 - 5.0 * tile;
        let (lon, lat) = proj.inverse(x, y).unwrap();
        assert!((lat - 40.0).abs() < 1e-6, "lat = {}", lat);
        assert!((lon - (-130.5407)).abs() < 1e-3, "lon = {}", lon);
    }

    #[test]
    fn test_roundtrip() {
        let proj = Sinusoidal::modis();
        let (x, y) = proj.forward(-119.42, 36.78);
        let (lon, lat) = proj.inverse(x, y).unwrap();
        assert!((lon - (-119.42)).abs() < 1e-9);
        assert!((lat - 36.78).abs() < 1e-9);
    }

    #[test]
    fn test_outside_domain() {
        let proj = Sinusoidal::modis();
        // Far east at 80°N is off the projected world.
        let (_, y) = proj.forward(0.0, 80.0);
        assert!(proj.inverse(19_000_000.0, y).is_none());
    }
}
