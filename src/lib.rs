//! # BIOTOPE
//!
//! Closed 2D ecosystem simulator: generated terrain with flowing water,
//! plants, herding herbivores and hunting predators, under a seasonal
//! climate.
//!
//! ## Features
//!
//! - **Terrain**: procedural water bodies with smoothing and shoreline refinement
//! - **Hydrology**: rain, flooding, flow toward low ground and evaporation
//! - **Animals**: physiology, herding, hunting, mating and inherited traits
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: one seeded random generator drives every decision
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use biotope::{Config, Ecosystem};
//!
//! let mut eco = Ecosystem::from_config(&Config::default(), 42).unwrap();
//! eco.run(500).unwrap();
//!
//! println!("{}", eco.census().summary());
//! ```
//!
//! ## Steering
//!
//! ```rust
//! use biotope::{Ecosystem, SimCommand};
//!
//! let mut eco = Ecosystem::initialize(20, 30, 10, 5, 7).unwrap();
//! eco.apply_command(SimCommand::ToggleManualTemperature);
//! eco.apply_command(SimCommand::RaiseTemperature);
//! eco.apply_command(SimCommand::SetPrecipitation(40.0));
//! eco.tick().unwrap();
//! ```

pub mod animal;
pub mod behavior;
pub mod commands;
pub mod config;
pub mod ecology;
pub mod ecosystem;
pub mod error;
pub mod grid;
pub mod plant;
pub mod snapshot;
pub mod stats;

// Re-export main types
pub use animal::{Animal, DeathCause, Sex, Species};
pub use commands::{CommandOutcome, SimCommand};
pub use config::Config;
pub use ecology::{Season, Terrain, TerrainGrid};
pub use ecosystem::Ecosystem;
pub use error::{Result, SimError};
pub use snapshot::EcosystemSnapshot;
pub use stats::{Census, TickSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark on the default world
pub fn benchmark(ticks: u64, herbivores: usize, predators: usize) -> Result<BenchmarkResult> {
    use std::time::Instant;

    let mut config = Config::default();
    config.world.initial_herbivores = herbivores;
    config.world.initial_predators = predators;

    let mut eco = Ecosystem::from_config(&config, 42)?;

    let start = Instant::now();
    eco.run(ticks)?;
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        ticks,
        initial_animals: herbivores + predators,
        final_herbivores: eco.living(Species::Herbivore),
        final_predators: eco.living(Species::Predator),
        final_plants: eco.plants().len(),
        elapsed_secs: elapsed.as_secs_f64(),
        ticks_per_second: ticks as f64 / elapsed.as_secs_f64(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub ticks: u64,
    pub initial_animals: usize,
    pub final_herbivores: usize,
    pub final_predators: usize,
    pub final_plants: usize,
    pub elapsed_secs: f64,
    pub ticks_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Ticks: {}", self.ticks)?;
        writeln!(
            f,
            "Animals: {} -> {} herbivores, {} predators",
            self.initial_animals, self.final_herbivores, self.final_predators
        )?;
        writeln!(f, "Plants: {}", self.final_plants)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} ticks/s", self.ticks_per_second)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_simulation() {
        let mut eco = Ecosystem::initialize(20, 20, 10, 5, 1).unwrap();
        eco.run(100).unwrap();
        assert_eq!(eco.cycle(), 100);
    }

    #[test]
    fn test_benchmark() {
        let result = benchmark(20, 30, 10).unwrap();
        assert_eq!(result.ticks, 20);
        assert!(result.ticks_per_second > 0.0);
    }
}
