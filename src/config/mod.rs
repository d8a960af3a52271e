use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::utils::geo::GeoPoint;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub map: MapConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Where document files live when using the file backend
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: default_store_backend(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::File
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Run the departure simulation in the background
    #[serde(default = "default_simulation_enabled")]
    pub enabled: bool,
    /// Seconds between ticks (default: 5)
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Chance per station per tick that one vehicle leaves (default: 0.2)
    #[serde(default = "default_departure_probability")]
    pub departure_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: default_simulation_enabled(),
            interval_seconds: default_interval_seconds(),
            departure_probability: default_departure_probability(),
        }
    }
}

fn default_simulation_enabled() -> bool {
    true
}

fn default_interval_seconds() -> u64 {
    5
}

fn default_departure_probability() -> f64 {
    0.2
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Populate demo users and stations into an empty store
    #[serde(default = "default_seed_enabled")]
    pub enabled: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: default_seed_enabled(),
        }
    }
}

fn default_seed_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// Map center used before the user's position is known
    #[serde(default = "default_center")]
    pub default_center: GeoPoint,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: default_center(),
        }
    }
}

fn default_center() -> GeoPoint {
    GeoPoint {
        lat: 12.9716,
        lng: 77.5946,
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse configuration file")?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let p = self.simulation.departure_probability;
        if !(0.0..=1.0).contains(&p) {
            bail!("simulation.departure_probability must be between 0 and 1, got {}", p);
        }
        if self.simulation.interval_seconds == 0 {
            bail!("simulation.interval_seconds must be greater than 0");
        }
        let center = self.map.default_center;
        GeoPoint::new(center.lat, center.lng)
            .map_err(|e| anyhow::anyhow!("map.default_center: {}", e))?;
        Ok(())
    }
}
