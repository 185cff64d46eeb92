//! Configuration system for the ecosystem simulation.
//!
//! Supports YAML configuration files with sensible defaults. Animal behavior
//! rules are fixed and have no configuration knobs.

use crate::ecology::{ClimateConfig, HydrologyConfig, SeasonsConfig, TerrainConfig};
use crate::error::{Result, SimError};
use crate::plant::PlantConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    #[serde(default)]
    pub terrain: TerrainConfig,
    #[serde(default)]
    pub hydrology: HydrologyConfig,
    #[serde(default)]
    pub climate: ClimateConfig,
    #[serde(default)]
    pub seasons: SeasonsConfig,
    #[serde(default)]
    pub plants: PlantConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// World size and starting populations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Grid height in cells
    pub rows: usize,
    /// Grid width in cells
    pub cols: usize,
    pub initial_herbivores: usize,
    pub initial_predators: usize,
    /// Plants sown on random land cells at start
    pub initial_plants: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Ticks between progress lines (0 = never)
    pub stats_interval: u64,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            rows: 76,
            cols: 102,
            initial_herbivores: 150,
            initial_predators: 75,
            initial_plants: 200,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 50,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: &str) -> Result<()> {
            Err(SimError::Config(msg.to_string()))
        }
        fn probability(p: f64) -> bool {
            (0.0..=1.0).contains(&p)
        }

        if self.world.rows == 0 || self.world.cols == 0 {
            return invalid("rows and cols must be > 0");
        }
        if !probability(self.terrain.water_chance) {
            return invalid("terrain.water_chance must be within [0, 1]");
        }
        if self.terrain.initial_water_volume <= self.hydrology.water_threshold {
            return invalid("terrain.initial_water_volume must exceed hydrology.water_threshold");
        }
        if !(0.0..=100.0).contains(&self.hydrology.precipitation_level) {
            return invalid("hydrology.precipitation_level must be within [0, 100]");
        }
        if !(0.0..=100.0).contains(&self.hydrology.flood_elevation_threshold) {
            return invalid("hydrology.flood_elevation_threshold must be within [0, 100]");
        }
        if !probability(self.hydrology.flow_fraction) {
            return invalid("hydrology.flow_fraction must be within [0, 1]");
        }
        if self.hydrology.flood_increment < 0.0
            || self.hydrology.base_evaporation < 0.0
            || self.hydrology.evaporation_per_degree < 0.0
        {
            return invalid("hydrology rates must be non-negative");
        }
        if self.climate.half_period <= 0.0 {
            return invalid("climate.half_period must be > 0");
        }
        if self.seasons.season_duration == 0 {
            return invalid("seasons.season_duration must be > 0");
        }
        if !probability(self.plants.growth_chance) {
            return invalid("plants.growth_chance must be within [0, 1]");
        }
        Ok(())
    }
}
