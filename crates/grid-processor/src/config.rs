//! Configuration for daily composite generation.

use aod_common::CrsCode;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How overlapping valid cells are combined when mosaicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// The first grid (in input order) holding a valid value wins.
    #[default]
    First,
    /// The last grid holding a valid value wins.
    Last,
    /// Smallest valid value.
    Min,
    /// Largest valid value.
    Max,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Combine the value already in a cell with a new valid candidate.
    #[inline]
    pub fn combine(&self, existing: f64, candidate: f64) -> f64 {
        match self {
            Self::First => existing,
            Self::Last => candidate,
            Self::Min => existing.min(candidate),
            Self::Max => existing.max(candidate),
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    /// Parse from string (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(format!(
                "unknown merge policy '{}', expected first|last|min|max",
                other
            )),
        }
    }
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings for building daily composites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// CRS every granule is reprojected into before mosaicking.
    pub target_crs: CrsCode,

    /// Rule for cells covered by more than one granule.
    pub merge_policy: MergePolicy,

    /// Replace the source nodata sentinel with this value in the composite.
    pub nodata_override: Option<f64>,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            target_crs: CrsCode::Epsg4326,
            merge_policy: MergePolicy::First,
            nodata_override: None,
        }
    }
}

impl CompositeConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults; malformed values are errors.
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("AOD_TARGET_CRS") {
            config.target_crs = CrsCode::parse(&val).map_err(|e| e.to_string())?;
        }

        if let Ok(val) = std::env::var("AOD_MERGE_POLICY") {
            config.merge_policy = val.parse()?;
        }

        if let Ok(val) = std::env::var("AOD_NODATA") {
            let nodata = val
                .parse::<f64>()
                .map_err(|_| format!("AOD_NODATA is not a number: {}", val))?;
            config.nodata_override = Some(nodata);
        }

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(nodata) = self.nodata_override {
            if !nodata.is_finite() {
                return Err("nodata_override must be a finite number".to_string());
            }
            // Composites are stored as Int16.
            if nodata.round() < i16::MIN as f64 || nodata.round() > i16::MAX as f64 {
                return Err(format!("nodata_override {} is outside the Int16 range", nodata));
            }
        }
        Ok(())
    }
}
