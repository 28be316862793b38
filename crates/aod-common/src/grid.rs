//! Georeferenced raster containers.
//!
//! A [`Grid`] is a single band of samples plus the affine transform, CRS and
//! nodata sentinel needed to place it on the map. A [`Raster`] carries several
//! bands sharing the same georeferencing, which is how a raw granule arrives.

use num_traits::NumCast;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::{BoundingBox, CrsCode};

/// Affine transform from pixel indices to map coordinates.
///
/// Only north-up transforms are represented; `pixel_height` is negative when
/// row 0 is the northern edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub origin_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            origin_y,
            pixel_height,
        }
    }

    /// Map coordinates of a (fractional) pixel position.
    pub fn pixel_to_coord(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        )
    }

    /// Map coordinates of the centre of pixel `(col, row)`.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.pixel_to_coord(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Fractional pixel position of a map coordinate.
    pub fn coord_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Outer edges of a `width` x `height` grid laid out with this transform.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let (x0, y0) = self.pixel_to_coord(0.0, 0.0);
        let (x1, y1) = self.pixel_to_coord(width as f64, height as f64);
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Pixel sizes as positive numbers `(x, y)`.
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width.abs(), self.pixel_height.abs())
    }

    /// Compare two transforms coefficient by coefficient within `eps`.
    pub fn approx_eq(&self, other: &GeoTransform, eps: f64) -> bool {
        (self.origin_x - other.origin_x).abs() <= eps
            && (self.pixel_width - other.pixel_width).abs() <= eps
            && (self.origin_y - other.origin_y).abs() <= eps
            && (self.pixel_height - other.pixel_height).abs() <= eps
    }
}

/// Storage type of the samples in a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    Int16,
    Float32,
}

impl std::fmt::Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleType::Int16 => write!(f, "int16"),
            SampleType::Float32 => write!(f, "float32"),
        }
    }
}

/// A numeric sample type a band can hold.
pub trait Sample: Copy + PartialEq + Send + Sync + 'static {
    const TYPE: SampleType;

    fn to_f64(self) -> f64;

    /// Convert a floating value into this type. Integer types round to the
    /// nearest value and saturate at their range.
    fn from_f64(value: f64) -> Self;
}

impl Sample for i16 {
    const TYPE: SampleType = SampleType::Int16;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        let rounded = value.round();
        <i16 as NumCast>::from(rounded).unwrap_or(if rounded < 0.0 {
            i16::MIN
        } else {
            i16::MAX
        })
    }
}

impl Sample for f32 {
    const TYPE: SampleType = SampleType::Float32;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

/// Row-major sample buffer of one band.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    I16(Vec<i16>),
    F32(Vec<f32>),
}

impl Samples {
    pub fn sample_type(&self) -> SampleType {
        match self {
            Samples::I16(_) => SampleType::Int16,
            Samples::F32(_) => SampleType::Float32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::I16(v) => v.len(),
            Samples::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at a flat index widened to `f64`.
    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            Samples::I16(v) => v.get(index).map(|s| s.to_f64()),
            Samples::F32(v) => v.get(index).map(|s| s.to_f64()),
        }
    }

    /// Overwrite the value at `index`, converting to the buffer's type.
    pub fn set(&mut self, index: usize, value: f64) {
        match self {
            Samples::I16(v) => v[index] = i16::from_f64(value),
            Samples::F32(v) => v[index] = f32::from_f64(value),
        }
    }
}

/// Shared sentinel test: NaN never counts as a valid measurement.
#[inline]
pub fn is_nodata(value: f64, nodata: f64) -> bool {
    value.is_nan() || value == nodata
}

/// A single-band georeferenced raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub crs: CrsCode,
    /// Reserved value meaning "no valid measurement".
    pub nodata: f64,
    pub samples: Samples,
}

impl Grid {
    /// Create a grid, checking the buffer length against the dimensions.
    pub fn new(
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: CrsCode,
        nodata: f64,
        samples: Samples,
    ) -> GridResult<Self> {
        check_shape(width, height, &samples)?;
        Ok(Self {
            width,
            height,
            transform,
            crs,
            nodata,
            samples,
        })
    }

    pub fn sample_type(&self) -> SampleType {
        self.samples.sample_type()
    }

    /// Outer edges of the grid in CRS units.
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw value at `(col, row)`, sentinel included.
    pub fn value(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.samples.get(row * self.width + col)
    }

    /// Value at `(col, row)` unless it is nodata or out of range.
    pub fn valid_value(&self, col: usize, row: usize) -> Option<f64> {
        self.value(col, row).filter(|v| !is_nodata(*v, self.nodata))
    }

    pub fn is_nodata(&self, value: f64) -> bool {
        is_nodata(value, self.nodata)
    }

    /// Swap the sentinel, rewriting every nodata cell to the new value.
    pub fn replace_nodata(&mut self, nodata: f64) {
        for i in 0..self.len() {
            if self.samples.get(i).is_some_and(|v| self.is_nodata(v)) {
                self.samples.set(i, nodata);
            }
        }
        self.nodata = nodata;
    }

    /// Copy of this grid stored as Int16.
    ///
    /// Valid values are rounded to the nearest integer and clamped; NaN and
    /// nodata cells become the (rounded) sentinel.
    pub fn to_int16(&self) -> Grid {
        let nodata = i16::from_f64(self.nodata);
        let values = (0..self.len())
            .map(|i| match self.samples.get(i) {
                Some(v) if !self.is_nodata(v) => i16::from_f64(v),
                _ => nodata,
            })
            .collect();
        Grid {
            width: self.width,
            height: self.height,
            transform: self.transform,
            crs: self.crs,
            nodata: nodata as f64,
            samples: Samples::I16(values),
        }
    }

    /// Number of cells holding a valid measurement.
    pub fn valid_count(&self) -> usize {
        (0..self.len())
            .filter_map(|i| self.samples.get(i))
            .filter(|v| !self.is_nodata(*v))
            .count()
    }
}

/// A multi-band raster sharing one georeferencing.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub crs: CrsCode,
    pub nodata: f64,
    pub bands: Vec<Samples>,
}

impl Raster {
    /// Create a raster. Every band must match the dimensions and share one sample type.
    pub fn new(
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: CrsCode,
        nodata: f64,
        bands: Vec<Samples>,
    ) -> GridResult<Self> {
        for band in &bands {
            check_shape(width, height, band)?;
        }
        if let Some(first) = bands.first() {
            if bands.iter().any(|b| b.sample_type() != first.sample_type()) {
                return Err(GridError::MixedSampleTypes);
            }
        }
        Ok(Self {
            width,
            height,
            transform,
            crs,
            nodata,
            bands,
        })
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Sample type of the bands, `None` when there are none.
    pub fn sample_type(&self) -> Option<SampleType> {
        self.bands.first().map(Samples::sample_type)
    }

    /// Wrap one band into a [`Grid`] with this raster's georeferencing.
    pub fn band(&self, index: usize) -> Option<Grid> {
        self.bands.get(index).map(|samples| Grid {
            width: self.width,
            height: self.height,
            transform: self.transform,
            crs: self.crs,
            nodata: self.nodata,
            samples: samples.clone(),
        })
    }
}

impl From<Grid> for Raster {
    fn from(grid: Grid) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            transform: grid.transform,
            crs: grid.crs,
            nodata: grid.nodata,
            bands: vec![grid.samples],
        }
    }
}

fn check_shape(width: usize, height: usize, samples: &Samples) -> GridResult<()> {
    if width == 0 || height == 0 {
        return Err(GridError::EmptyGrid { width, height });
    }
    let expected = width * height;
    if samples.len() != expected {
        return Err(GridError::ShapeMismatch {
            width,
            height,
            expected,
            actual: samples.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> GeoTransform {
        GeoTransform::new(-120.0, 0.5, 40.0, -0.5)
    }

    #[test]
    fn test_bounds_north_up() {
        let bbox = transform().bounds(4, 2);
        assert_eq!(bbox, BoundingBox::new(-120.0, 39.0, -118.0, 40.0));
    }

    #[test]
    fn test_pixel_center_roundtrip() {
        let t = transform();
        let (x, y) = t.pixel_center(3, 1);
        let (col, row) = t.coord_to_pixel(x, y);
        assert_eq!(col.floor() as usize, 3);
        assert_eq!(row.floor() as usize, 1);
    }

    #[test]
    fn test_grid_rejects_bad_shape() {
        let result = Grid::new(
            3,
            3,
            transform(),
            CrsCode::Epsg4326,
            -9999.0,
            Samples::I16(vec![0; 8]),
        );
        assert!(matches!(result, Err(GridError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_i16_from_f64_rounds_and_saturates() {
        assert_eq!(i16::from_f64(2.5), 3);
        assert_eq!(i16::from_f64(-2.5), -3);
        assert_eq!(i16::from_f64(1.0e9), i16::MAX);
        assert_eq!(i16::from_f64(-1.0e9), i16::MIN);
    }

    #[test]
    fn test_valid_value_skips_sentinel() {
        let grid = Grid::new(
            2,
            1,
            transform(),
            CrsCode::Epsg4326,
            -9999.0,
            Samples::I16(vec![-9999, 42]),
        )
        .unwrap();
        assert_eq!(grid.valid_value(0, 0), None);
        assert_eq!(grid.valid_value(1, 0), Some(42.0));
        assert_eq!(grid.valid_count(), 1);
    }

    #[test]
    fn test_replace_nodata() {
        let mut grid = Grid::new(
            3,
            1,
            transform(),
            CrsCode::Epsg4326,
            -28672.0,
            Samples::I16(vec![-28672, 7, -28672]),
        )
        .unwrap();
        grid.replace_nodata(-9999.0);
        assert_eq!(grid.samples, Samples::I16(vec![-9999, 7, -9999]));
        assert_eq!(grid.nodata, -9999.0);
    }

    #[test]
    fn test_to_int16_normalises_floats() {
        let grid = Grid::new(
            3,
            1,
            transform(),
            CrsCode::Epsg4326,
            -28672.0,
            Samples::F32(vec![f32::NAN, 12.6, -28672.0]),
        )
        .unwrap();
        let ints = grid.to_int16();
        assert_eq!(ints.samples, Samples::I16(vec![-28672, 13, -28672]));
        assert_eq!(ints.nodata, -28672.0);
    }

    #[test]
    fn test_raster_rejects_mixed_types() {
        let result = Raster::new(
            1,
            1,
            transform(),
            CrsCode::Epsg4326,
            -9999.0,
            vec![Samples::I16(vec![1]), Samples::F32(vec![1.0])],
        );
        assert!(matches!(result, Err(GridError::MixedSampleTypes)));
    }
}
