//! Climate and water: ambient temperature, rain, flooding, flow and evaporation.
//!
//! The environment update runs once per tick, before any animal acts:
//! 1. Ambient temperature follows a sine curve unless manually controlled
//! 2. Rain may fall; flooded cells receive water, then water flows downhill
//! 3. Extreme heat dries every water body at once
//! 4. Optional evaporation drains water cells a little each tick

use super::terrain::{Terrain, TerrainGrid};
use crate::error::{Result, SimError};
use crate::grid::{neighbors, NEIGHBORS_4, NEIGHBORS_8};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Smallest increment that still floods a dry cell
pub const MIN_FLOOD_AMOUNT: f64 = 1.0;

/// Climate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateConfig {
    /// Mean ambient temperature (°C)
    pub base_temperature: f64,
    /// Swing of the temperature curve (°C)
    pub amplitude: f64,
    /// Ticks for half a sine wave
    pub half_period: f64,
    /// Start with manual temperature control enabled
    pub manual_control: bool,
    /// Ambient temperature at which all water boils off
    pub extreme_heat: f64,
    /// Ambient temperature at which plants die
    pub plant_death_temperature: f64,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            base_temperature: 20.0,
            amplitude: 10.0,
            half_period: 180.0,
            manual_control: false,
            extreme_heat: 100.0,
            plant_death_temperature: 35.0,
        }
    }
}

/// Hydrology configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrologyConfig {
    /// Chance of rain per tick, in percent (0-100)
    pub precipitation_level: f64,
    /// Water added at a flood source; halves at each flood step
    pub flood_increment: f64,
    /// Dry cells below this elevation flood when rain reaches them
    pub flood_elevation_threshold: f64,
    /// Fraction of volume pushed to each lower neighbor
    pub flow_fraction: f64,
    /// Volume separating water cells from dry ones
    pub water_threshold: f64,
    pub evaporation_enabled: bool,
    /// Evaporation in percent of volume per tick at 20 °C
    pub base_evaporation: f64,
    /// Additional evaporation percent per degree above 20 °C
    pub evaporation_per_degree: f64,
}

impl Default for HydrologyConfig {
    fn default() -> Self {
        Self {
            precipitation_level: 0.0,
            flood_increment: 50.0,
            flood_elevation_threshold: 0.2,
            flow_fraction: 0.05,
            water_threshold: 10.0,
            evaporation_enabled: false,
            base_evaporation: 0.1,
            evaporation_per_degree: 1.05,
        }
    }
}

/// What the environment update did this tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HydrologyReport {
    pub rained: bool,
    /// Dry cells turned into water by flooding or inflow
    pub flooded: usize,
    /// Water cells turned dry by outflow, heat or evaporation
    pub dried: usize,
    pub evaporated_volume: f64,
}

/// Ambient climate and water engine
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Environment {
    pub ambient_temperature: f64,
    pub manual_temperature_control: bool,
    precipitation_level: f64,
    pub evaporation_enabled: bool,
    climate: ClimateConfig,
    hydrology: HydrologyConfig,
}

impl Environment {
    pub fn new(climate: &ClimateConfig, hydrology: &HydrologyConfig) -> Self {
        Self {
            ambient_temperature: climate.base_temperature,
            manual_temperature_control: climate.manual_control,
            precipitation_level: hydrology.precipitation_level.clamp(0.0, 100.0),
            evaporation_enabled: hydrology.evaporation_enabled,
            climate: climate.clone(),
            hydrology: hydrology.clone(),
        }
    }

    pub fn climate(&self) -> &ClimateConfig {
        &self.climate
    }

    pub fn precipitation_level(&self) -> f64 {
        self.precipitation_level
    }

    /// Set the chance of rain (percent, clamped to 0-100)
    pub fn set_precipitation_level(&mut self, level: f64) {
        self.precipitation_level = level.clamp(0.0, 100.0);
    }

    /// Run the full environment update for one tick
    pub fn update(
        &mut self,
        grid: &mut TerrainGrid,
        cycle: u64,
        rng: &mut impl Rng,
    ) -> Result<HydrologyReport> {
        let mut report = HydrologyReport::default();

        self.adjust_temperature(cycle);

        if self.should_rain(rng) {
            report.rained = true;
            report.flooded += self.flood_fill(grid);
            let (flooded, dried) = self.redistribute(grid);
            report.flooded += flooded;
            report.dried += dried;
        }

        report.dried += self.handle_extreme_heat(grid);

        if self.evaporation_enabled {
            let (evaporated, dried) = self.evaporate(grid);
            report.evaporated_volume = evaporated;
            report.dried += dried;
        }

        check_water(grid)?;
        Ok(report)
    }

    /// Sine-curve temperature, skipped while under manual control
    pub fn adjust_temperature(&mut self, cycle: u64) {
        if !self.manual_temperature_control {
            self.ambient_temperature = seasonal_temperature(cycle, &self.climate);
        }
    }

    fn should_rain(&self, rng: &mut impl Rng) -> bool {
        f64::from(rng.gen_range(0u32..=100)) < self.precipitation_level
    }

    /// Spread rain outward from every water body.
    ///
    /// Sources are the water cells at the start of the pass. Low dry cells
    /// reached through the 4-neighborhood become water, and each step away
    /// from the source carries half the previous increment. The spread stops
    /// once that half would fall below [`MIN_FLOOD_AMOUNT`], so every flooded
    /// cell holds water.
    pub fn flood_fill(&self, grid: &mut TerrainGrid) -> usize {
        let rows = grid.rows();
        let cols = grid.cols();
        let sources = grid.positions_of(Terrain::Water);
        let mut flooded = 0;

        for (row, col) in sources {
            let mut stack = vec![(row, col, self.hydrology.flood_increment)];
            while let Some((r, c, amount)) = stack.pop() {
                let idx = grid.index(r, c);
                grid.cells_mut()[idx].water_volume += amount;

                let next = amount / 2.0;
                if next < MIN_FLOOD_AMOUNT {
                    continue;
                }
                for (nr, nc) in neighbors(r, c, &NEIGHBORS_4, rows, cols) {
                    let nidx = grid.index(nr, nc);
                    let neighbor = &mut grid.cells_mut()[nidx];
                    if !neighbor.is_water()
                        && neighbor.elevation < self.hydrology.flood_elevation_threshold
                    {
                        neighbor.terrain = Terrain::Water;
                        flooded += 1;
                        stack.push((nr, nc, next));
                    }
                }
            }
        }

        flooded
    }

    /// Push water downhill, reclassifying cells that cross the threshold.
    ///
    /// Cells are visited row-major and updated in place. Reclassified cells
    /// keep their volume. Returns `(flooded, dried)` counts.
    pub fn redistribute(&self, grid: &mut TerrainGrid) -> (usize, usize) {
        let rows = grid.rows();
        let cols = grid.cols();
        let threshold = self.hydrology.water_threshold;
        let mut flooded = 0;
        let mut dried = 0;

        for row in 0..rows {
            for col in 0..cols {
                let src = grid.index(row, col);
                if !grid.cells()[src].is_water() {
                    continue;
                }

                for (r, c) in neighbors(row, col, &NEIGHBORS_8, rows, cols) {
                    let dst = grid.index(r, c);
                    let cells = grid.cells_mut();
                    if !cells[src].is_water() {
                        break;
                    }
                    if cells[dst].elevation >= cells[src].elevation {
                        continue;
                    }

                    let moved = cells[src].water_volume * self.hydrology.flow_fraction;
                    cells[src].water_volume -= moved;
                    cells[dst].water_volume += moved;

                    if cells[src].water_volume < threshold {
                        cells[src].terrain = Terrain::Land;
                        dried += 1;
                    }
                    if cells[dst].water_volume > threshold && !cells[dst].is_water() {
                        cells[dst].terrain = Terrain::Water;
                        flooded += 1;
                    }
                }
            }
        }

        (flooded, dried)
    }

    /// Boil off every water body when the air is hot enough
    pub fn handle_extreme_heat(&self, grid: &mut TerrainGrid) -> usize {
        if self.ambient_temperature < self.climate.extreme_heat {
            return 0;
        }

        let mut dried = 0;
        for cell in grid.cells_mut() {
            if cell.is_water() {
                cell.terrain = Terrain::Land;
                cell.water_volume = 0.0;
                dried += 1;
            }
        }
        if dried > 0 {
            log::info!(
                "Extreme heat ({:.1}°C) dried {} water cells",
                self.ambient_temperature,
                dried
            );
        }
        dried
    }

    /// Evaporation rate in percent of volume per tick for a cell
    pub fn evaporation_rate(&self, elevation: f64) -> f64 {
        let excess = (self.ambient_temperature - 20.0).max(0.0);
        let rate =
            self.hydrology.base_evaporation + self.hydrology.evaporation_per_degree * excess;
        rate * (1.0 + 0.01 * elevation)
    }

    /// Drain water cells; drained cells become land. Returns `(volume, dried)`.
    pub fn evaporate(&self, grid: &mut TerrainGrid) -> (f64, usize) {
        let threshold = self.hydrology.water_threshold;
        let mut total = 0.0;
        let mut dried = 0;

        for idx in 0..grid.cells().len() {
            let cell = grid.cells()[idx];
            if !cell.is_water() {
                continue;
            }

            let fraction = (self.evaporation_rate(cell.elevation) / 100.0).min(1.0);
            let lost = cell.water_volume * fraction;
            let cell = &mut grid.cells_mut()[idx];
            cell.water_volume = (cell.water_volume - lost).max(0.0);
            total += lost;

            if cell.water_volume < threshold {
                total += cell.water_volume;
                cell.water_volume = 0.0;
                cell.terrain = Terrain::Land;
                dried += 1;
            }
        }

        (total, dried)
    }
}

/// Ambient temperature on the sine curve at a given cycle
pub fn seasonal_temperature(cycle: u64, climate: &ClimateConfig) -> f64 {
    let phase = std::f64::consts::PI * cycle as f64 / climate.half_period;
    climate.amplitude * phase.sin() + climate.base_temperature
}

/// Fail on negative volume or on water cells holding nothing
pub fn check_water(grid: &TerrainGrid) -> Result<()> {
    for (idx, cell) in grid.cells().iter().enumerate() {
        if cell.water_volume < 0.0 || (cell.is_water() && cell.water_volume <= 0.0) {
            return Err(SimError::Invariant(format!(
                "cell ({}, {}) holds {} water as {:?}",
                idx / grid.cols(),
                idx % grid.cols(),
                cell.water_volume,
                cell.terrain
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn environment() -> Environment {
        Environment::new(&ClimateConfig::default(), &HydrologyConfig::default())
    }

    #[test]
    fn test_temperature_curve() {
        let climate = ClimateConfig::default();
        assert!((seasonal_temperature(0, &climate) - 20.0).abs() < 1e-9);
        assert!((seasonal_temperature(90, &climate) - 30.0).abs() < 1e-9);
        assert!((seasonal_temperature(270, &climate) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_manual_control_freezes_temperature() {
        let mut env = environment();
        env.manual_temperature_control = true;
        env.ambient_temperature = 33.0;
        env.adjust_temperature(90);
        assert_eq!(env.ambient_temperature, 33.0);
    }

    #[test]
    fn test_no_rain_at_zero_precipitation() {
        let mut env = environment();
        let mut grid = TerrainGrid::new(5, 5).unwrap();
        grid.make_water(2, 2, 100.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for cycle in 0..50 {
            let report = env.update(&mut grid, cycle, &mut rng).unwrap();
            assert!(!report.rained);
        }
        assert_eq!(grid.get(2, 2).unwrap().water_volume, 100.0);
    }

    #[test]
    fn test_flood_fill_reaches_low_cells() {
        let env = environment();
        let mut grid = TerrainGrid::new(1, 4).unwrap();
        grid.make_water(0, 0, 100.0);
        grid.get_mut(0, 1).unwrap().elevation = 0.1;
        grid.get_mut(0, 2).unwrap().elevation = 0.1;

        let flooded = env.flood_fill(&mut grid);

        assert_eq!(flooded, 2);
        assert_eq!(grid.get(0, 0).unwrap().water_volume, 150.0);
        assert_eq!(grid.get(0, 1).unwrap().water_volume, 25.0);
        assert_eq!(grid.get(0, 2).unwrap().water_volume, 12.5);
        assert!(!grid.get(0, 3).unwrap().is_water());
    }

    #[test]
    fn test_flood_fill_on_low_plain_leaves_no_empty_water() {
        let hydrology = HydrologyConfig {
            flood_elevation_threshold: 60.0,
            ..HydrologyConfig::default()
        };
        let env = Environment::new(&ClimateConfig::default(), &hydrology);
        let mut grid = TerrainGrid::new(60, 60).unwrap();
        grid.make_water(0, 0, 100.0);

        let flooded = env.flood_fill(&mut grid);

        assert!(flooded > 0);
        assert!(flooded < 60 * 60 - 1);
        assert!(check_water(&grid).is_ok());
        assert!(grid
            .cells()
            .iter()
            .filter(|c| c.is_water())
            .all(|c| c.water_volume >= MIN_FLOOD_AMOUNT));
    }

    #[test]
    fn test_redistribute_flows_downhill() {
        let env = environment();
        let mut grid = TerrainGrid::new(1, 2).unwrap();
        grid.make_water(0, 0, 100.0);
        grid.get_mut(0, 0).unwrap().elevation = 60.0;
        grid.get_mut(0, 1).unwrap().elevation = 10.0;

        env.redistribute(&mut grid);

        assert!((grid.get(0, 0).unwrap().water_volume - 95.0).abs() < 1e-9);
        assert!((grid.get(0, 1).unwrap().water_volume - 5.0).abs() < 1e-9);
        assert!(!grid.get(0, 1).unwrap().is_water());
    }

    #[test]
    fn test_redistribute_dries_shallow_source() {
        let env = environment();
        let mut grid = TerrainGrid::new(1, 2).unwrap();
        grid.make_water(0, 0, 10.2);
        grid.get_mut(0, 0).unwrap().elevation = 60.0;
        grid.get_mut(0, 1).unwrap().elevation = 10.0;

        let (_, dried) = env.redistribute(&mut grid);

        assert_eq!(dried, 1);
        let source = grid.get(0, 0).unwrap();
        assert_eq!(source.terrain, Terrain::Land);
        assert!(source.water_volume > 0.0);
    }

    #[test]
    fn test_redistribute_floods_destination_past_threshold() {
        let env = environment();
        let mut grid = TerrainGrid::new(1, 2).unwrap();
        grid.make_water(0, 0, 300.0);
        grid.get_mut(0, 0).unwrap().elevation = 60.0;
        grid.get_mut(0, 1).unwrap().elevation = 10.0;
        let before = grid.total_water();

        let (flooded, dried) = env.redistribute(&mut grid);

        assert_eq!((flooded, dried), (1, 0));
        let destination = grid.get(0, 1).unwrap();
        assert_eq!(destination.terrain, Terrain::Water);
        assert!((destination.water_volume - 15.0).abs() < 1e-9);
        assert!((grid.total_water() - before).abs() < 1e-9);
        assert!(check_water(&grid).is_ok());
    }

    #[test]
    fn test_extreme_heat_dries_everything() {
        let mut env = environment();
        env.ambient_temperature = 100.0;
        let mut grid = TerrainGrid::filled(3, 3, Terrain::Water).unwrap();

        assert_eq!(env.handle_extreme_heat(&mut grid), 9);
        assert!(grid.cells().iter().all(|c| c.terrain == Terrain::Land));
        assert!(grid.cells().iter().all(|c| c.water_volume == 0.0));
    }

    #[test]
    fn test_evaporation_grows_with_heat_and_elevation() {
        let mut env = environment();
        env.ambient_temperature = 20.0;
        let cool = env.evaporation_rate(50.0);
        env.ambient_temperature = 30.0;
        let hot = env.evaporation_rate(50.0);
        assert!(hot > cool);
        assert!(env.evaporation_rate(90.0) > env.evaporation_rate(10.0));
    }

    #[test]
    fn test_evaporation_drains_to_land() {
        let mut env = environment();
        env.ambient_temperature = 40.0;
        let mut grid = TerrainGrid::new(1, 1).unwrap();
        grid.make_water(0, 0, 10.5);

        let (_, dried) = env.evaporate(&mut grid);

        assert_eq!(dried, 1);
        let cell = grid.get(0, 0).unwrap();
        assert_eq!(cell.terrain, Terrain::Land);
        assert_eq!(cell.water_volume, 0.0);
        assert!(check_water(&grid).is_ok());
    }

    #[test]
    fn test_check_water_detects_empty_water_cell() {
        let mut grid = TerrainGrid::new(2, 2).unwrap();
        grid.set_terrain(1, 1, Terrain::Water).unwrap();
        assert!(matches!(check_water(&grid), Err(SimError::Invariant(_))));
    }

    #[test]
    fn test_precipitation_level_clamped() {
        let mut env = environment();
        env.set_precipitation_level(150.0);
        assert_eq!(env.precipitation_level(), 100.0);
        env.set_precipitation_level(-3.0);
        assert_eq!(env.precipitation_level(), 0.0);
    }
}
