//! Read-only snapshots of ecosystem state.
//!
//! These are plain copies for renderers, graphs and exports. Nothing here
//! can reach back into the simulation.

use crate::animal::{AnimalId, Color, Sex, Species};
use crate::ecology::{Season, Terrain};
use crate::ecosystem::Ecosystem;
use serde::{Deserialize, Serialize};

/// One grid cell as seen from outside
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellView {
    pub terrain: Terrain,
    pub elevation: f64,
    pub water_volume: f64,
    pub feces: bool,
    pub urine: bool,
}

/// Lightweight view of an animal for rendering
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimalView {
    pub id: AnimalId,
    pub species: Species,
    pub sex: Sex,
    pub row: usize,
    pub col: usize,
    pub is_adult: bool,
    pub is_dead: bool,
    pub is_pregnant: bool,
    pub decay: f64,
    /// Display color; dead animals fade to gray with their decay
    pub color: Color,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlantView {
    pub row: usize,
    pub col: usize,
    pub nutrition: f64,
}

/// Complete ecosystem snapshot
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EcosystemSnapshot {
    pub cycle: u64,
    pub season: Season,
    pub ambient_temperature: f64,
    pub precipitation_level: f64,
    pub manual_temperature_control: bool,
    pub rows: usize,
    pub cols: usize,
    /// Row-major cells
    pub cells: Vec<CellView>,
    pub animals: Vec<AnimalView>,
    pub plants: Vec<PlantView>,
}

impl EcosystemSnapshot {
    /// Create a snapshot from the current ecosystem state
    pub fn from_ecosystem(eco: &Ecosystem) -> Self {
        let grid = eco.grid();

        let cells = grid
            .cells()
            .iter()
            .map(|c| CellView {
                terrain: c.terrain,
                elevation: c.elevation,
                water_volume: c.water_volume,
                feces: c.flags.feces,
                urine: c.flags.urine,
            })
            .collect();

        let animals = eco
            .populations()
            .iter()
            .map(|a| AnimalView {
                id: a.id,
                species: a.species,
                sex: a.sex,
                row: a.row,
                col: a.col,
                is_adult: a.is_adult,
                is_dead: a.is_dead,
                is_pregnant: a.is_pregnant,
                decay: a.decay,
                color: if a.is_dead {
                    let shade = (255.0 * a.decay / 100.0).round() as u8;
                    [shade; 3]
                } else {
                    a.color
                },
            })
            .collect();

        let plants = eco
            .plants()
            .iter()
            .map(|(row, col, p)| PlantView {
                row,
                col,
                nutrition: p.nutrition,
            })
            .collect();

        Self {
            cycle: eco.cycle(),
            season: eco.season(),
            ambient_temperature: eco.ambient_temperature(),
            precipitation_level: eco.precipitation_level(),
            manual_temperature_control: eco.manual_temperature_control(),
            rows: grid.rows(),
            cols: grid.cols(),
            cells,
            animals,
            plants,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellView> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Text map: terrain symbols with living animals drawn on top
    pub fn to_ascii(&self) -> String {
        let mut chars: Vec<char> = self.cells.iter().map(|c| c.terrain.symbol()).collect();
        for animal in self.animals.iter().filter(|a| !a.is_dead) {
            let mark = match animal.species {
                Species::Herbivore => 'h',
                Species::Predator => 'P',
            };
            chars[animal.row * self.cols + animal.col] = mark;
        }

        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in chars.chunks(self.cols) {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}
