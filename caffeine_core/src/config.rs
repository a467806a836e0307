//! Configuration file support.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/caffeine/config.toml`.

use crate::sampler::SeriesMode;
use crate::window::{Anchor, RangeSpec};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub drinks: DrinksConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Chart defaults used when the command line doesn't say otherwise
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub range: RangeSpec,

    #[serde(default)]
    pub anchor: Anchor,

    #[serde(default)]
    pub series: SeriesMode,
}

/// User-defined drink
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomDrink {
    pub name: String,
    pub caffeine_mg: f64,
    pub color: Option<String>,
}

/// Custom drinks configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DrinksConfig {
    #[serde(default)]
    pub custom: Vec<CustomDrink>,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("caffeine")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("caffeine")
            .join("config.toml")
    }

    /// Save the current configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
