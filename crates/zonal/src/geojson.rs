//! GeoJSON input types.
//!
//! Only what region loading needs: a FeatureCollection of features with
//! properties and Polygon/MultiPolygon geometries. Other geometry types are
//! accepted by the parser and rejected later with a useful message.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<Feature>,
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// Optional feature identifier (string or number).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,

    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Identifier from `field` in the properties, falling back to the
    /// feature-level `id`. Strings and numbers are accepted.
    pub fn identifier(&self, field: &str) -> Option<String> {
        self.properties
            .as_ref()
            .and_then(|p| p.get(field))
            .and_then(value_to_id)
            .or_else(|| self.id.as_ref().and_then(value_to_id))
    }
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A position: `[x, y]` with an optional ignored `z`.
pub type Position = Vec<f64>;

/// GeoJSON geometry objects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    /// Point, LineString, GeometryCollection and friends.
    #[serde(other)]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_polygon_feature() {
        let json = r#"{
            "type": "Feature",
            "id": 7,
            "properties": {"GEOID": "06037", "ALAND": 1000},
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}
        }"#;
        let feature: Feature = serde_json::from_str(json).unwrap();
        assert_eq!(feature.identifier("GEOID").as_deref(), Some("06037"));
        assert_eq!(feature.identifier("ALAND").as_deref(), Some("1000"));
        assert_eq!(feature.identifier("missing").as_deref(), Some("7"));
        assert!(matches!(feature.geometry, Some(Geometry::Polygon { .. })));
    }

    #[test]
    fn test_unsupported_geometry() {
        let json = r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#;
        let geometry: Geometry = serde_json::from_str(json).unwrap();
        assert_eq!(geometry, Geometry::Unsupported);
    }
}
