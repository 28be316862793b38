//! CRS-to-CRS point transforms and default warp output computation.

use aod_common::{BoundingBox, CrsCode, GeoTransform};

use crate::error::{ProjectionError, Result};
use crate::{Sinusoidal, WebMercator};

/// Points sampled along each source edge when estimating the output extent.
const EDGE_STEPS: usize = 20;

/// Transform between two CRSs, pivoting through geographic lon/lat.
#[derive(Debug, Clone, Copy)]
pub struct CrsTransform {
    src: CrsCode,
    dst: CrsCode,
}

impl CrsTransform {
    pub fn new(src: CrsCode, dst: CrsCode) -> Self {
        Self { src, dst }
    }

    /// Build a transform from CRS strings such as "EPSG:4326".
    pub fn from_strings(src: &str, dst: &str) -> Result<Self> {
        Ok(Self::new(CrsCode::parse(src)?, CrsCode::parse(dst)?))
    }

    pub fn src(&self) -> CrsCode {
        self.src
    }

    pub fn dst(&self) -> CrsCode {
        self.dst
    }

    /// Source and destination describe the same coordinate space.
    pub fn is_identity(&self) -> bool {
        self.src.is_equivalent(&self.dst)
    }

    /// The transform in the opposite direction.
    pub fn inverse(&self) -> Self {
        Self::new(self.dst, self.src)
    }

    /// Transform one point, `None` when it lies outside either projection's domain.
    pub fn apply(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.is_identity() {
            return Some((x, y));
        }
        let (lon, lat) = to_geographic(self.src, x, y)?;
        from_geographic(self.dst, lon, lat)
    }

    /// Transform one point, reporting failures as errors.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        self.apply(x, y).ok_or_else(|| ProjectionError::OutOfDomain {
            x,
            y,
            src: self.src.to_string(),
            dst: self.dst.to_string(),
        })
    }

    /// Transform a sequence of points, failing on the first one out of domain.
    pub fn transform_points(&self, points: &[(f64, f64)]) -> Result<Vec<(f64, f64)>> {
        points.iter().map(|&(x, y)| self.transform(x, y)).collect()
    }
}

fn to_geographic(crs: CrsCode, x: f64, y: f64) -> Option<(f64, f64)> {
    match crs {
        CrsCode::Epsg4326 | CrsCode::Epsg4269 => Some((x, y)),
        CrsCode::Epsg3857 => Some(WebMercator::new().inverse(x, y)),
        CrsCode::ModisSinusoidal => Sinusoidal::modis().inverse(x, y),
    }
}

fn from_geographic(crs: CrsCode, lon: f64, lat: f64) -> Option<(f64, f64)> {
    if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
        return None;
    }
    match crs {
        CrsCode::Epsg4326 | CrsCode::Epsg4269 => Some((lon, lat)),
        CrsCode::Epsg3857 => Some(WebMercator::new().forward(lon, lat)),
        CrsCode::ModisSinusoidal => Some(Sinusoidal::modis().forward(lon, lat)),
    }
}

/// Output georeferencing chosen for a reprojection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpOutput {
    pub transform: GeoTransform,
    pub width: usize,
    pub height: usize,
}

impl WarpOutput {
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }
}

/// Compute the default output transform and size for reprojecting a
/// `width` x `height` grid from `src` to `dst`.
///
/// Points along the four source edges are transformed to estimate the target
/// extent. The target uses square pixels whose size keeps the source's pixel
/// count along the extent diagonal. When source and target CRS are the same
/// space the source georeferencing is returned unchanged.
pub fn default_transform(
    src: CrsCode,
    dst: CrsCode,
    width: usize,
    height: usize,
    src_transform: &GeoTransform,
) -> Result<WarpOutput> {
    let crs_transform = CrsTransform::new(src, dst);
    if crs_transform.is_identity() {
        return Ok(WarpOutput {
            transform: *src_transform,
            width,
            height,
        });
    }

    let no_points = || ProjectionError::NoValidPoints {
        src: src.to_string(),
        dst: dst.to_string(),
        width,
        height,
    };

    let w = width as f64;
    let h = height as f64;
    let mut pixel_points = Vec::with_capacity(4 * (EDGE_STEPS + 1));
    for step in 0..=EDGE_STEPS {
        let t = step as f64 / EDGE_STEPS as f64;
        pixel_points.push((t * w, 0.0));
        pixel_points.push((t * w, h));
        pixel_points.push((0.0, t * h));
        pixel_points.push((w, t * h));
    }

    let projected = pixel_points.into_iter().filter_map(|(col, row)| {
        let (x, y) = src_transform.pixel_to_coord(col, row);
        crs_transform.apply(x, y)
    });
    let extent = BoundingBox::from_points(projected).ok_or_else(no_points)?;

    let diagonal = extent.width().hypot(extent.height());
    let pixel_diagonal = w.hypot(h);
    if diagonal <= 0.0 || pixel_diagonal <= 0.0 {
        return Err(no_points());
    }
    let resolution = diagonal / pixel_diagonal;

    let out_width = ((extent.width() / resolution + 0.5) as usize).max(1);
    let out_height = ((extent.height() / resolution + 0.5) as usize).max(1);

    Ok(WarpOutput {
        transform: GeoTransform::new(extent.min_x, resolution, extent.max_y, -resolution),
        width: out_width,
        height: out_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_keeps_source_georeferencing() {
        let t = GeoTransform::new(-125.0, 0.01, 42.0, -0.02);
        let out = default_transform(CrsCode::Epsg4326, CrsCode::Epsg4326, 300, 100, &t).unwrap();
        assert_eq!(out.transform, t);
        assert_eq!((out.width, out.height), (300, 100));
    }

    #[test]
    fn test_geographic_to_mercator_extent() {
        let t = GeoTransform::new(-10.0, 1.0, 10.0, -1.0);
        let out = default_transform(CrsCode::Epsg4326, CrsCode::Epsg3857, 20, 20, &t).unwrap();
        let bounds = out.bounds();
        let (x, _) = WebMercator::new().forward(10.0, 0.0);
        assert!((bounds.min_x + x).abs() < 1.0, "min_x = {}", bounds.min_x);
        assert!(out.transform.pixel_height < 0.0);
        assert_eq!(out.transform.pixel_width, -out.transform.pixel_height);
        // Square-ish input stays square-ish.
        assert!((out.width as i64 - out.height as i64).abs() <= 1);
    }

    #[test]
    fn test_sinusoidal_tile_to_geographic() {
        // MODIS tile h08v05 at 1 km: 1200x1200 pixels of 926.625 m.
        let pixel = 926.625_433_055_833_3;
        let t = GeoTransform::new(-11_119_505.196_667, pixel, 4_447_802.078_667, -pixel);
        let out =
            default_transform(CrsCode::ModisSinusoidal, CrsCode::Epsg4326, 1200, 1200, &t).unwrap();
        let bounds = out.bounds();
        assert!((bounds.max_y - 40.0).abs() < 0.05, "max_y = {}", bounds.max_y);
        assert!((bounds.min_y - 30.0).abs() < 0.05, "min_y = {}", bounds.min_y);
        // Western edge is reached at the tile's northern corner.
        assert!(bounds.min_x < -130.0 && bounds.min_x > -131.0, "min_x = {}", bounds.min_x);
        assert!(out.width > out.height);
    }

    #[test]
    fn test_point_roundtrip_through_sinusoidal() {
        let fwd = CrsTransform::new(CrsCode::Epsg4326, CrsCode::ModisSinusoidal);
        let (x, y) = fwd.transform(-120.0, 35.0).unwrap();
        let (lon, lat) = fwd.inverse().transform(x, y).unwrap();
        assert!((lon + 120.0).abs() < 1e-9);
        assert!((lat - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_crs_string() {
        assert!(matches!(
            CrsTransform::from_strings("EPSG:4326", "EPSG:32611"),
            Err(ProjectionError::InvalidCrs(_))
        ));
    }
}
