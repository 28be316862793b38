//! Polygon regions for zonal statistics.

use std::collections::HashSet;
use std::path::Path;

use aod_common::{BoundingBox, CrsCode};
use projection::CrsTransform;
use tracing::{debug, info};

use crate::config::ZonalConfig;
use crate::error::{Result, ZonalError};
use crate::geojson::{FeatureCollection, Geometry, Position};

/// A ring of `(x, y)` vertices. Closing vertex optional.
pub type Ring = Vec<(f64, f64)>;

/// One polygon: an exterior ring minus any holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    /// Even-odd test across all rings, so points in holes are outside.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let mut inside = ring_crossings(&self.exterior, x, y);
        for hole in &self.holes {
            if ring_crossings(hole, x, y) {
                inside = !inside;
            }
        }
        inside
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.exterior.iter().copied())
    }
}

/// Ray casting: true when a ray from `(x, y)` crosses the ring an odd
/// number of times.
fn ring_crossings(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// A named area of interest made of one or more polygons.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: String,
    pub polygons: Vec<Polygon>,
}

impl Region {
    pub fn new(id: impl Into<String>, polygons: Vec<Polygon>) -> Self {
        Self {
            id: id.into(),
            polygons,
        }
    }

    /// A single-polygon region without holes.
    pub fn from_ring(id: impl Into<String>, exterior: Ring) -> Self {
        Self::new(id, vec![Polygon::new(exterior, Vec::new())])
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.polygons.iter().any(|p| p.contains_point(x, y))
    }

    /// Bounding box of all exterior rings.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.polygons
            .iter()
            .filter_map(Polygon::bbox)
            .reduce(|a, b| a.union(&b))
    }

    /// Transform every vertex with `transform`.
    pub fn reproject(&self, transform: &CrsTransform) -> Result<Region> {
        let ring = |r: &Ring| -> Result<Ring> { Ok(transform.transform_points(r)?) };
        let polygons = self
            .polygons
            .iter()
            .map(|p| {
                Ok(Polygon::new(
                    ring(&p.exterior)?,
                    p.holes.iter().map(|h| ring(h)).collect::<Result<_>>()?,
                ))
            })
            .collect::<Result<_>>()?;
        Ok(Region::new(self.id.clone(), polygons))
    }
}

/// Reproject a set of regions from `src` into `dst`.
pub fn reproject_regions(regions: &[Region], src: CrsCode, dst: CrsCode) -> Result<Vec<Region>> {
    let transform = CrsTransform::new(src, dst);
    if transform.is_identity() {
        return Ok(regions.to_vec());
    }
    regions.iter().map(|r| r.reproject(&transform)).collect()
}

/// Load regions from a GeoJSON file. Coordinates stay in the file's CRS.
pub fn load_regions(path: &Path, config: &ZonalConfig) -> Result<Vec<Region>> {
    let text = std::fs::read_to_string(path)?;
    let regions = parse_regions(&text, config)?;
    info!(
        path = %path.display(),
        regions = regions.len(),
        crs = %config.region_crs,
        "Loaded regions"
    );
    Ok(regions)
}

/// Parse regions from GeoJSON text, keeping coordinates as they are.
///
/// Every feature needs an identifier under `config.id_field` (or a feature
/// `id`) and a Polygon or MultiPolygon geometry; identifiers must be unique.
pub fn parse_regions(text: &str, config: &ZonalConfig) -> Result<Vec<Region>> {
    let collection: FeatureCollection = serde_json::from_str(text)?;
    let mut seen = HashSet::new();
    let mut regions = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.iter().enumerate() {
        let id = feature.identifier(&config.id_field).ok_or_else(|| {
            ZonalError::InvalidRegion(format!(
                "feature {} has no '{}' property or id",
                index, config.id_field
            ))
        })?;
        if !seen.insert(id.clone()) {
            return Err(ZonalError::InvalidRegion(format!(
                "duplicate region id '{}'",
                id
            )));
        }

        let polygons = match &feature.geometry {
            Some(Geometry::Polygon { coordinates }) => vec![polygon(coordinates, &id)?],
            Some(Geometry::MultiPolygon { coordinates }) => coordinates
                .iter()
                .map(|p| polygon(p, &id))
                .collect::<Result<_>>()?,
            Some(Geometry::Unsupported) | None => {
                return Err(ZonalError::InvalidRegion(format!(
                    "region '{}' has no polygonal geometry",
                    id
                )))
            }
        };
        regions.push(Region::new(id, polygons));
    }

    debug!(regions = regions.len(), "Parsed regions");
    Ok(regions)
}

fn polygon(rings: &[Vec<Position>], id: &str) -> Result<Polygon> {
    let mut rings = rings.iter().map(|r| ring(r, id));
    let exterior = rings.next().ok_or_else(|| {
        ZonalError::InvalidRegion(format!("region '{}' has an empty polygon", id))
    })??;
    let holes = rings.collect::<Result<_>>()?;
    Ok(Polygon::new(exterior, holes))
}

fn ring(positions: &[Position], id: &str) -> Result<Ring> {
    if positions.len() < 3 {
        return Err(ZonalError::InvalidRegion(format!(
            "region '{}' has a ring with {} vertices",
            id,
            positions.len()
        )));
    }
    positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok((*x, *y)),
            _ => Err(ZonalError::InvalidRegion(format!(
                "region '{}' has a position with {} values",
                id,
                p.len()
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        vec![
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ]
    }

    #[test]
    fn test_contains_point_with_hole() {
        let poly = Polygon::new(square(0.0, 0.0, 10.0), vec![square(4.0, 4.0, 2.0)]);
        assert!(poly.contains_point(1.0, 1.0));
        assert!(!poly.contains_point(5.0, 5.0));
        assert!(!poly.contains_point(11.0, 5.0));
    }

    #[test]
    fn test_multipolygon_bbox() {
        let region = Region::new(
            "a",
            vec![
                Polygon::new(square(0.0, 0.0, 1.0), vec![]),
                Polygon::new(square(5.0, 5.0, 1.0), vec![]),
            ],
        );
        assert_eq!(region.bbox(), Some(BoundingBox::new(0.0, 0.0, 6.0, 6.0)));
        assert!(region.contains_point(5.5, 5.5));
        assert!(!region.contains_point(3.0, 3.0));
    }

    #[test]
    fn test_parse_regions_id_field() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"GEOID": "06001"},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[0,0],[1,0],[1,1],[0,0]]]]}}
        ]}"#;
        let config = ZonalConfig {
            id_field: "GEOID".to_string(),
            ..Default::default()
        };
        let regions = parse_regions(json, &config).unwrap();
        assert_eq!(regions[0].id, "06001");
        assert_eq!(regions[0].polygons.len(), 1);
    }

    #[test]
    fn test_parse_rejects_bad_features() {
        let no_id = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        let point = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"id": "p"},
             "geometry": {"type": "Point", "coordinates": [0, 0]}}
        ]}"#;
        let dup = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": "a",
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type": "Feature", "id": "a",
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        let config = ZonalConfig::default();
        for json in [no_id, point, dup] {
            assert!(matches!(
                parse_regions(json, &config),
                Err(ZonalError::InvalidRegion(_))
            ));
        }
    }

    #[test]
    fn test_reproject_regions_identity() {
        let regions = vec![Region::from_ring("a", square(0.0, 0.0, 1.0))];
        let out = reproject_regions(&regions, CrsCode::Epsg4326, CrsCode::Epsg4269).unwrap();
        assert_eq!(out, regions);
    }

    #[test]
    fn test_reproject_regions_to_mercator() {
        let regions = vec![Region::from_ring("a", square(0.0, 0.0, 1.0))];
        let out = reproject_regions(&regions, CrsCode::Epsg4326, CrsCode::Epsg3857).unwrap();
        test_utils::assert_bounds_approx_eq!(
            out[0].bbox().unwrap(),
            (0.0, 0.0, 111_319.49, 111_325.14),
            1.0
        );
    }
}
