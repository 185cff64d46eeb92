//! Terrain grid: cell types, world generation, smoothing and shorelines.
//!
//! Generation runs in three stages that all draw from the caller's seeded
//! generator:
//! 1. Random elevation per cell, low cells become water with some chance
//! 2. Water bodies grow into cells surrounded by water
//! 3. Window smoothing, then isolated water removal and sandy shorelines

use crate::error::{Result, SimError};
use crate::grid::{neighbors, NEIGHBORS_4, NEIGHBORS_8};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Terrain types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Water,
    Land,
    Vegetation,
    Sand,
}

impl Terrain {
    /// Can an animal stand on this terrain?
    #[inline]
    pub fn is_passable(&self) -> bool {
        matches!(self, Terrain::Land | Terrain::Vegetation)
    }

    /// Get display character for visualization
    pub fn symbol(&self) -> char {
        match self {
            Terrain::Water => '▓',
            Terrain::Land => '▒',
            Terrain::Vegetation => '♣',
            Terrain::Sand => '░',
        }
    }

    /// Get RGB color for visualization
    pub fn color(&self) -> [u8; 3] {
        match self {
            Terrain::Water => [0, 0, 255],
            Terrain::Land => [139, 69, 19],
            Terrain::Vegetation => [0, 255, 0],
            Terrain::Sand => [255, 255, 0],
        }
    }
}

/// Waste markers left by animals
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellFlags {
    pub feces: bool,
    pub urine: bool,
}

/// A single grid cell
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub terrain: Terrain,
    pub elevation: f64,
    pub water_volume: f64,
    pub flags: CellFlags,
}

impl Cell {
    pub fn new(terrain: Terrain, elevation: f64, water_volume: f64) -> Self {
        Self {
            terrain,
            elevation,
            water_volume,
            flags: CellFlags::default(),
        }
    }

    #[inline]
    pub fn is_water(&self) -> bool {
        self.terrain == Terrain::Water
    }
}

/// Terrain generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Cells below this elevation may start as water
    pub water_elevation: f64,
    /// Chance a low cell starts as water
    pub water_chance: f64,
    /// Water volume given to freshly created water cells
    pub initial_water_volume: f64,
    /// Passes of water body expansion
    pub expansion_cycles: usize,
    /// Water neighbors needed to turn a cell into water during expansion
    pub expansion_threshold: usize,
    /// Passes of window smoothing
    pub smoothing_iterations: usize,
    /// Half-width of the smoothing window (2 = 5x5)
    pub smoothing_radius: usize,
    /// Water samples in the window needed to flood a cell
    pub smoothing_water_threshold: usize,
    /// Water cells with fewer water neighbors than this dry out
    pub isolated_water_threshold: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            water_elevation: 30.0,
            water_chance: 0.4,
            initial_water_volume: 100.0,
            expansion_cycles: 3,
            expansion_threshold: 3,
            smoothing_iterations: 3,
            smoothing_radius: 2,
            smoothing_water_threshold: 10,
            isolated_water_threshold: 2,
        }
    }
}

/// Terrain grid for the world (row-major)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerrainGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl TerrainGrid {
    /// Create a flat grid of dry land
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Self::filled(rows, cols, Terrain::Land)
    }

    /// Create a grid where every cell has the same terrain at elevation 50
    pub fn filled(rows: usize, cols: usize, terrain: Terrain) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(SimError::Config(format!(
                "grid dimensions must be positive, got {}x{}",
                rows, cols
            )));
        }
        let volume = if terrain == Terrain::Water { 100.0 } else { 0.0 };
        Ok(Self {
            rows,
            cols,
            cells: vec![Cell::new(terrain, 50.0, volume); rows * cols],
        })
    }

    /// Generate, smooth and refine a new world
    pub fn generate(
        rows: usize,
        cols: usize,
        config: &TerrainConfig,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        let mut grid = Self::new(rows, cols)?;

        for cell in &mut grid.cells {
            let elevation = rng.gen_range(0.0..=100.0);
            let terrain = if elevation < config.water_elevation {
                if rng.gen::<f64>() < config.water_chance {
                    Terrain::Water
                } else {
                    Terrain::Land
                }
            } else if rng.gen_bool(0.5) {
                Terrain::Vegetation
            } else {
                Terrain::Land
            };
            let volume = if terrain == Terrain::Water {
                config.initial_water_volume
            } else {
                0.0
            };
            *cell = Cell::new(terrain, elevation, volume);
        }

        grid.expand_water_bodies(config);
        grid.smooth(config);
        grid.refine_shorelines(config, rng);

        Ok(grid)
    }

    /// Grow water into cells already surrounded by water
    pub fn expand_water_bodies(&mut self, config: &TerrainConfig) {
        for _ in 0..config.expansion_cycles {
            let mut new_water = Vec::new();
            for row in 0..self.rows {
                for col in 0..self.cols {
                    if !self.cells[self.index(row, col)].is_water()
                        && self.count_water_neighbors(row, col) >= config.expansion_threshold
                    {
                        new_water.push((row, col));
                    }
                }
            }

            for (row, col) in new_water {
                self.make_water(row, col, config.initial_water_volume);
            }
        }
    }

    /// Window smoothing: a cell floods when enough of its window is water
    pub fn smooth(&mut self, config: &TerrainConfig) {
        let radius = config.smoothing_radius as isize;

        for _ in 0..config.smoothing_iterations {
            let old = self.cells.clone();
            for row in 0..self.rows {
                for col in 0..self.cols {
                    let mut water = 0;
                    for dr in -radius..=radius {
                        for dc in -radius..=radius {
                            let r = row as isize + dr;
                            let c = col as isize + dc;
                            if r >= 0
                                && c >= 0
                                && (r as usize) < self.rows
                                && (c as usize) < self.cols
                                && old[r as usize * self.cols + c as usize].is_water()
                            {
                                water += 1;
                            }
                        }
                    }

                    let idx = self.index(row, col);
                    if water > config.smoothing_water_threshold && !old[idx].is_water() {
                        self.make_water(row, col, config.initial_water_volume);
                    }
                }
            }
        }
    }

    /// Dry out isolated water cells, then ring water bodies with sand
    pub fn refine_shorelines(&mut self, config: &TerrainConfig, rng: &mut impl Rng) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let idx = self.index(row, col);
                if self.cells[idx].is_water()
                    && self.count_water_neighbors(row, col) < config.isolated_water_threshold
                {
                    let terrain = if rng.gen_bool(0.5) {
                        Terrain::Land
                    } else {
                        Terrain::Sand
                    };
                    let cell = &mut self.cells[idx];
                    cell.terrain = terrain;
                    cell.water_volume = 0.0;
                }
            }
        }

        let mut shore = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let terrain = self.cells[self.index(row, col)].terrain;
                if matches!(terrain, Terrain::Land | Terrain::Vegetation)
                    && self.is_adjacent_to_water(row, col)
                {
                    shore.push((row, col));
                }
            }
        }
        for (row, col) in shore {
            let idx = self.index(row, col);
            self.cells[idx].terrain = Terrain::Sand;
        }
    }

    #[inline]
    pub(crate) fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Grid height
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid width
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Get a cell, failing on out-of-bounds coordinates
    pub fn get(&self, row: usize, col: usize) -> Result<&Cell> {
        if self.in_bounds(row, col) {
            Ok(&self.cells[self.index(row, col)])
        } else {
            Err(SimError::OutOfBounds { row, col })
        }
    }

    /// Mutable cell access, failing on out-of-bounds coordinates
    pub fn get_mut(&mut self, row: usize, col: usize) -> Result<&mut Cell> {
        if self.in_bounds(row, col) {
            let idx = self.index(row, col);
            Ok(&mut self.cells[idx])
        } else {
            Err(SimError::OutOfBounds { row, col })
        }
    }

    /// Terrain at position
    #[inline]
    pub fn terrain(&self, row: usize, col: usize) -> Option<Terrain> {
        self.get(row, col).ok().map(|c| c.terrain)
    }

    /// Change the terrain of a cell without touching its water
    pub fn set_terrain(&mut self, row: usize, col: usize, terrain: Terrain) -> Result<()> {
        self.get_mut(row, col)?.terrain = terrain;
        Ok(())
    }

    /// Turn a cell into water holding at least `volume` units
    pub(crate) fn make_water(&mut self, row: usize, col: usize, volume: f64) {
        let idx = self.index(row, col);
        let cell = &mut self.cells[idx];
        cell.terrain = Terrain::Water;
        cell.water_volume = cell.water_volume.max(volume);
    }

    /// All cells, row-major
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Water cells among the 8 neighbors
    pub fn count_water_neighbors(&self, row: usize, col: usize) -> usize {
        neighbors(row, col, &NEIGHBORS_8, self.rows, self.cols)
            .filter(|&(r, c)| self.cells[self.index(r, c)].is_water())
            .count()
    }

    /// Water directly north, south, east or west
    pub fn is_adjacent_to_water(&self, row: usize, col: usize) -> bool {
        neighbors(row, col, &NEIGHBORS_4, self.rows, self.cols)
            .any(|(r, c)| self.cells[self.index(r, c)].is_water())
    }

    /// Water anywhere in the 8-neighborhood (drinking range)
    pub fn has_water_nearby(&self, row: usize, col: usize) -> bool {
        self.count_water_neighbors(row, col) > 0
    }

    /// Passable cells in the 8-neighborhood, in offset order
    pub fn passable_neighbors(&self, row: usize, col: usize) -> Vec<(usize, usize)> {
        neighbors(row, col, &NEIGHBORS_8, self.rows, self.cols)
            .filter(|&(r, c)| self.cells[self.index(r, c)].terrain.is_passable())
            .collect()
    }

    /// Coordinates of every cell with the given terrain, row-major
    pub fn positions_of(&self, terrain: Terrain) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.terrain == terrain)
            .map(|(i, _)| (i / self.cols, i % self.cols))
            .collect()
    }

    /// Count terrain types
    pub fn terrain_counts(&self) -> std::collections::HashMap<Terrain, usize> {
        let mut counts = std::collections::HashMap::new();
        for cell in &self.cells {
            *counts.entry(cell.terrain).or_insert(0) += 1;
        }
        counts
    }

    /// Total water held by the grid
    pub fn total_water(&self) -> f64 {
        self.cells.iter().map(|c| c.water_volume).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generated(seed: u64) -> TerrainGrid {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        TerrainGrid::generate(40, 60, &TerrainConfig::default(), &mut rng).unwrap()
    }

    #[test]
    fn test_passability() {
        assert!(Terrain::Land.is_passable());
        assert!(Terrain::Vegetation.is_passable());
        assert!(!Terrain::Water.is_passable());
        assert!(!Terrain::Sand.is_passable());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(TerrainGrid::new(0, 10), Err(SimError::Config(_))));
        assert!(matches!(TerrainGrid::new(10, 0), Err(SimError::Config(_))));
    }

    #[test]
    fn test_generation_dimensions() {
        let grid = generated(1);
        assert_eq!(grid.rows(), 40);
        assert_eq!(grid.cols(), 60);
        assert_eq!(grid.cells().len(), 40 * 60);
    }

    #[test]
    fn test_generation_deterministic() {
        let a = generated(99);
        let b = generated(99);
        let ta: Vec<_> = a.cells().iter().map(|c| c.terrain).collect();
        let tb: Vec<_> = b.cells().iter().map(|c| c.terrain).collect();
        assert_eq!(ta, tb);
    }

    #[test]
    fn test_generated_water_has_volume() {
        let grid = generated(7);
        for cell in grid.cells() {
            assert!(cell.water_volume >= 0.0);
            if cell.is_water() {
                assert!(cell.water_volume > 0.0);
            }
            assert!((0.0..=100.0).contains(&cell.elevation));
        }
    }

    #[test]
    fn test_terrain_counts_cover_grid() {
        let mut grid = TerrainGrid::new(3, 4).unwrap();
        grid.make_water(0, 0, 40.0);
        grid.make_water(0, 1, 25.0);
        grid.set_terrain(2, 3, Terrain::Sand).unwrap();

        let counts = grid.terrain_counts();
        assert_eq!(counts.get(&Terrain::Water), Some(&2));
        assert_eq!(counts.get(&Terrain::Sand), Some(&1));
        assert_eq!(counts.get(&Terrain::Land), Some(&9));
        assert_eq!(counts.values().sum::<usize>(), 12);
        assert_eq!(grid.total_water(), 65.0);
    }

    #[test]
    fn test_shorelines_are_sand() {
        let grid = generated(3);
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let terrain = grid.terrain(row, col).unwrap();
                if matches!(terrain, Terrain::Land | Terrain::Vegetation) {
                    assert!(!grid.is_adjacent_to_water(row, col));
                }
            }
        }
    }

    #[test]
    fn test_expansion_fills_enclosed_cell() {
        let mut grid = TerrainGrid::new(3, 3).unwrap();
        for &(r, c) in &[(0, 0), (0, 1), (0, 2)] {
            grid.make_water(r, c, 100.0);
        }
        let config = TerrainConfig {
            expansion_cycles: 1,
            ..Default::default()
        };
        grid.expand_water_bodies(&config);

        // (1, 1) sees three water cells on its top edge
        assert!(grid.get(1, 1).unwrap().is_water());
        // (2, 1) sees none
        assert!(!grid.get(2, 1).unwrap().is_water());
    }

    #[test]
    fn test_isolated_water_dries() {
        let mut grid = TerrainGrid::new(5, 5).unwrap();
        grid.make_water(2, 2, 100.0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        grid.refine_shorelines(&TerrainConfig::default(), &mut rng);

        let cell = grid.get(2, 2).unwrap();
        assert!(matches!(cell.terrain, Terrain::Land | Terrain::Sand));
        assert_eq!(cell.water_volume, 0.0);
    }

    #[test]
    fn test_smoothing_floods_enclosed_cell() {
        let mut grid = TerrainGrid::new(5, 5).unwrap();
        for row in 0..5 {
            for col in 0..5 {
                if (row, col) != (2, 2) {
                    grid.make_water(row, col, 100.0);
                }
            }
        }
        let config = TerrainConfig {
            smoothing_iterations: 1,
            ..Default::default()
        };
        grid.smooth(&config);
        assert!(grid.get(2, 2).unwrap().is_water());
    }

    #[test]
    fn test_passable_neighbors_order() {
        let mut grid = TerrainGrid::new(3, 3).unwrap();
        grid.set_terrain(0, 1, Terrain::Sand).unwrap();
        let moves = grid.passable_neighbors(1, 1);
        assert_eq!(moves, vec![(0, 0), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)]);
    }
}
