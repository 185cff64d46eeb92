//! Plants and the plant layer.
//!
//! A plant exists only on a Vegetation cell and a Vegetation cell always
//! carries a plant: removing one reverts the cell to Land.

use crate::ecology::terrain::{Terrain, TerrainGrid};
use crate::error::{Result, SimError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Plant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantConfig {
    /// Chance per tick that a Land cell sprouts a plant
    pub growth_chance: f64,
    /// Nutrition of a new plant
    pub initial_nutrition: f64,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            growth_chance: 0.01,
            initial_nutrition: 30.0,
        }
    }
}

/// A plant on a Vegetation cell
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub nutrition: f64,
    pub is_dead: bool,
}

impl Plant {
    pub fn new(nutrition: f64) -> Self {
        Self {
            nutrition,
            is_dead: false,
        }
    }

    /// Die once the air is too hot
    pub fn handle_vital_stats(&mut self, ambient: f64, death_temperature: f64) {
        if ambient >= death_temperature {
            self.is_dead = true;
        }
    }
}

/// One optional plant per grid cell, row-major
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlantLayer {
    rows: usize,
    cols: usize,
    plants: Vec<Option<Plant>>,
}

impl PlantLayer {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            plants: vec![None; rows * cols],
        }
    }

    /// Give every Vegetation cell of `grid` a fresh plant
    pub fn from_grid(grid: &TerrainGrid, nutrition: f64) -> Self {
        let mut layer = Self::new(grid.rows(), grid.cols());
        for (slot, cell) in grid.cells().iter().enumerate() {
            if cell.terrain == Terrain::Vegetation {
                layer.plants[slot] = Some(Plant::new(nutrition));
            }
        }
        layer
    }

    #[inline]
    fn slot(&self, row: usize, col: usize) -> Result<usize> {
        if row < self.rows && col < self.cols {
            Ok(row * self.cols + col)
        } else {
            Err(SimError::OutOfBounds { row, col })
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Plant> {
        self.slot(row, col).ok().and_then(|s| self.plants[s].as_ref())
    }

    /// Put a plant on a cell, turning it into Vegetation
    pub fn sow(
        &mut self,
        grid: &mut TerrainGrid,
        row: usize,
        col: usize,
        nutrition: f64,
    ) -> Result<()> {
        let slot = self.slot(row, col)?;
        grid.set_terrain(row, col, Terrain::Vegetation)?;
        self.plants[slot] = Some(Plant::new(nutrition));
        Ok(())
    }

    /// Destroy the plant on a cell, reverting the cell to Land
    pub fn destroy(
        &mut self,
        grid: &mut TerrainGrid,
        row: usize,
        col: usize,
    ) -> Result<Option<Plant>> {
        let slot = self.slot(row, col)?;
        let plant = self.plants[slot].take();
        if plant.is_some() && grid.terrain(row, col) == Some(Terrain::Vegetation) {
            grid.set_terrain(row, col, Terrain::Land)?;
        }
        Ok(plant)
    }

    /// Seed up to `count` random Land cells with plants
    pub fn seed(
        &mut self,
        grid: &mut TerrainGrid,
        count: usize,
        nutrition: f64,
        rng: &mut impl Rng,
    ) -> Result<usize> {
        let mut free = grid.positions_of(Terrain::Land);
        let mut sown = 0;
        while sown < count && !free.is_empty() {
            let pick = rng.gen_range(0..free.len());
            let (row, col) = free.swap_remove(pick);
            self.sow(grid, row, col, nutrition)?;
            sown += 1;
        }
        if sown < count {
            log::warn!("Only {} of {} initial plants fit on land", sown, count);
        }
        Ok(sown)
    }

    /// Each Land cell sprouts a plant with the configured chance
    pub fn grow(
        &mut self,
        grid: &mut TerrainGrid,
        config: &PlantConfig,
        rng: &mut impl Rng,
    ) -> Result<usize> {
        let mut grown = 0;
        for row in 0..self.rows {
            for col in 0..self.cols {
                if grid.terrain(row, col) == Some(Terrain::Land)
                    && rng.gen::<f64>() < config.growth_chance
                {
                    self.sow(grid, row, col, config.initial_nutrition)?;
                    grown += 1;
                }
            }
        }
        Ok(grown)
    }

    /// Mark plants dead at the current ambient temperature
    pub fn update_vitals(&mut self, ambient: f64, death_temperature: f64) {
        for plant in self.plants.iter_mut().flatten() {
            plant.handle_vital_stats(ambient, death_temperature);
        }
    }

    /// Remove dead plants and revert their cells
    pub fn purge_dead(&mut self, grid: &mut TerrainGrid) -> Result<usize> {
        let mut purged = 0;
        for slot in 0..self.plants.len() {
            if matches!(self.plants[slot], Some(p) if p.is_dead) {
                self.destroy(grid, slot / self.cols, slot % self.cols)?;
                purged += 1;
            }
        }
        Ok(purged)
    }

    /// Destroy plants whose cell is no longer Vegetation
    pub fn sync_with_grid(&mut self, grid: &TerrainGrid) -> usize {
        let mut lost = 0;
        for (slot, plant) in self.plants.iter_mut().enumerate() {
            if plant.is_some() && grid.cells()[slot].terrain != Terrain::Vegetation {
                *plant = None;
                lost += 1;
            }
        }
        lost
    }

    /// Nutrition follows the temperature: +0.1 per degree above 20 °C, per tick
    pub fn drift_nutrition(&mut self, ambient: f64) {
        let delta = (ambient - 20.0) * 0.1;
        for plant in self.plants.iter_mut().flatten() {
            plant.nutrition += delta;
        }
    }

    /// Scale every plant's nutrition
    pub fn scale_nutrition(&mut self, factor: f64) {
        for plant in self.plants.iter_mut().flatten() {
            plant.nutrition *= factor;
        }
    }

    /// Number of plants
    pub fn len(&self) -> usize {
        self.plants.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.iter().all(Option::is_none)
    }

    /// Every `(row, col, plant)`, row-major
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Plant)> + '_ {
        let cols = self.cols;
        self.plants
            .iter()
            .enumerate()
            .filter_map(move |(slot, p)| p.as_ref().map(|p| (slot / cols, slot % cols, p)))
    }

    /// Check that plants and Vegetation cells match one to one
    pub fn check_coupling(&self, grid: &TerrainGrid) -> Result<()> {
        for (slot, cell) in grid.cells().iter().enumerate() {
            let vegetation = cell.terrain == Terrain::Vegetation;
            if vegetation != self.plants[slot].is_some() {
                return Err(SimError::Invariant(format!(
                    "cell ({}, {}) is {:?} but {} a plant",
                    slot / self.cols,
                    slot % self.cols,
                    cell.terrain,
                    if vegetation { "lacks" } else { "holds" }
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_plant_dies_in_heat() {
        let mut plant = Plant::new(30.0);
        plant.handle_vital_stats(34.9, 35.0);
        assert!(!plant.is_dead);
        plant.handle_vital_stats(35.0, 35.0);
        assert!(plant.is_dead);
    }

    #[test]
    fn test_sow_and_destroy() {
        let mut grid = TerrainGrid::new(3, 3).unwrap();
        let mut layer = PlantLayer::new(3, 3);

        layer.sow(&mut grid, 1, 1, 30.0).unwrap();
        assert_eq!(grid.terrain(1, 1), Some(Terrain::Vegetation));
        assert_eq!(layer.len(), 1);
        assert!(layer.check_coupling(&grid).is_ok());

        let plant = layer.destroy(&mut grid, 1, 1).unwrap();
        assert_eq!(plant, Some(Plant::new(30.0)));
        assert_eq!(grid.terrain(1, 1), Some(Terrain::Land));
        assert!(layer.is_empty());
    }

    #[test]
    fn test_growth_everywhere_at_full_chance() {
        let mut grid = TerrainGrid::new(4, 4).unwrap();
        grid.set_terrain(0, 0, Terrain::Sand).unwrap();
        let mut layer = PlantLayer::new(4, 4);
        let config = PlantConfig {
            growth_chance: 1.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(layer.grow(&mut grid, &config, &mut rng).unwrap(), 15);
        assert_eq!(grid.terrain(0, 0), Some(Terrain::Sand));
        assert!(layer.check_coupling(&grid).is_ok());
    }

    #[test]
    fn test_purge_dead_reverts_cells() {
        let mut grid = TerrainGrid::new(2, 2).unwrap();
        let mut layer = PlantLayer::new(2, 2);
        layer.sow(&mut grid, 0, 0, 30.0).unwrap();
        layer.sow(&mut grid, 1, 1, 30.0).unwrap();

        layer.update_vitals(36.0, 35.0);
        assert_eq!(layer.purge_dead(&mut grid).unwrap(), 2);
        assert!(layer.is_empty());
        assert!(layer.check_coupling(&grid).is_ok());
    }

    #[test]
    fn test_seed_limited_by_land() {
        let mut grid = TerrainGrid::filled(2, 2, Terrain::Water).unwrap();
        grid.set_terrain(0, 1, Terrain::Land).unwrap();
        grid.get_mut(0, 1).unwrap().water_volume = 0.0;
        let mut layer = PlantLayer::new(2, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        assert_eq!(layer.seed(&mut grid, 200, 30.0, &mut rng).unwrap(), 1);
        assert!(layer.get(0, 1).is_some());
    }

    #[test]
    fn test_sync_drops_flooded_plants() {
        let mut grid = TerrainGrid::new(2, 2).unwrap();
        let mut layer = PlantLayer::new(2, 2);
        layer.sow(&mut grid, 0, 0, 30.0).unwrap();
        grid.make_water(0, 0, 50.0);

        assert_eq!(layer.sync_with_grid(&grid), 1);
        assert!(layer.check_coupling(&grid).is_ok());
    }

    #[test]
    fn test_nutrition_drift_and_scaling() {
        let mut grid = TerrainGrid::new(1, 1).unwrap();
        let mut layer = PlantLayer::new(1, 1);
        layer.sow(&mut grid, 0, 0, 30.0).unwrap();

        layer.drift_nutrition(30.0);
        layer.scale_nutrition(0.5);
        let nutrition = layer.get(0, 0).map(|p| p.nutrition).unwrap();
        assert!((nutrition - 15.5).abs() < 1e-9);
    }
}
