//! Pipeline configuration.

use anyhow::{bail, Context, Result};
use grid_processor::CompositeConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use zonal::ZonalConfig;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root for downloaded granules; files land in `<raw_dir>/archives`.
    pub raw_dir: PathBuf,

    /// Root for derived products (composites and the zonal table).
    pub clean_dir: PathBuf,

    /// Daily composite settings
    pub composite: CompositeConfig,

    /// Number of date keys built concurrently
    pub parallel_dates: usize,

    /// GeoJSON file with the regions to summarise
    pub regions: Option<PathBuf>,

    /// Region loading settings
    pub zonal: ZonalConfig,

    /// Earthdata bearer token for LAADS DAAC downloads
    #[serde(skip_serializing)]
    pub earthdata_token: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            clean_dir: PathBuf::from("data/clean"),
            composite: CompositeConfig::default(),
            parallel_dates: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            regions: None,
            zonal: ZonalConfig::default(),
            earthdata_token: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            composite: CompositeConfig::from_env().map_err(anyhow::Error::msg)?,
            zonal: ZonalConfig::from_env().map_err(anyhow::Error::msg)?,
            ..Self::default()
        };

        if let Ok(val) = env::var("AOD_RAW_DIR") {
            config.raw_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("AOD_CLEAN_DIR") {
            config.clean_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("AOD_PARALLEL_DATES") {
            config.parallel_dates = val
                .parse()
                .with_context(|| format!("Invalid AOD_PARALLEL_DATES: {}", val))?;
        }
        if let Ok(val) = env::var("AOD_REGIONS") {
            config.regions = Some(PathBuf::from(val));
        }
        config.earthdata_token = env::var("EARTHDATA_TOKEN").ok().filter(|t| !t.is_empty());

        Ok(config)
    }

    /// Load configuration from a YAML file. The token is still taken from
    /// the environment.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        if config.earthdata_token.is_none() {
            config.earthdata_token = env::var("EARTHDATA_TOKEN").ok().filter(|t| !t.is_empty());
        }
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.parallel_dates == 0 {
            bail!("parallel_dates must be at least 1");
        }
        self.composite.validate().map_err(anyhow::Error::msg)?;
        self.zonal.validate().map_err(anyhow::Error::msg)?;
        Ok(())
    }

    /// Directory scanned for granules.
    pub fn granule_dir(&self) -> PathBuf {
        self.raw_dir.join("archives")
    }

    /// Directory holding one composite per date.
    pub fn composite_dir(&self) -> PathBuf {
        self.clean_dir.join("daily_AOD")
    }

    /// Output path of the zonal time-series table.
    pub fn table_path(&self) -> PathBuf {
        self.clean_dir.join("meanAOD.csv")
    }
}
