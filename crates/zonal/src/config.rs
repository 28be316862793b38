//! Configuration for region loading.

use aod_common::CrsCode;
use serde::{Deserialize, Serialize};

/// Where region identifiers and coordinates come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonalConfig {
    /// CRS of the region file's coordinates.
    pub region_crs: CrsCode,

    /// Feature property holding the region identifier.
    pub id_field: String,
}

impl Default for ZonalConfig {
    fn default() -> Self {
        Self {
            region_crs: CrsCode::Epsg4326,
            id_field: "id".to_string(),
        }
    }
}

impl ZonalConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("AOD_REGION_CRS") {
            config.region_crs = CrsCode::parse(&val).map_err(|e| e.to_string())?;
        }

        if let Ok(val) = std::env::var("AOD_REGION_ID_FIELD") {
            config.id_field = val;
        }

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.id_field.trim().is_empty() {
            return Err("id_field must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ZonalConfig::default();
        assert_eq!(config.region_crs, CrsCode::Epsg4326);
        assert_eq!(config.id_field, "id");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_id_field_rejected() {
        let config = ZonalConfig {
            id_field: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
