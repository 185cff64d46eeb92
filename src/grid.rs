//! Grid geometry and the spatial occupancy index.

use crate::animal::{AnimalId, Species};
use crate::error::{Result, SimError};

/// 8-neighborhood offsets, in the fixed order every scan uses.
pub const NEIGHBORS_8: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// 4-neighborhood offsets for adjacency and shoreline checks.
pub const NEIGHBORS_4: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Apply an offset to a coordinate, returning `None` when it leaves the grid.
#[inline]
pub fn offset(
    row: usize,
    col: usize,
    (dr, dc): (isize, isize),
    rows: usize,
    cols: usize,
) -> Option<(usize, usize)> {
    let r = row as isize + dr;
    let c = col as isize + dc;
    if r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols {
        Some((r as usize, c as usize))
    } else {
        None
    }
}

/// In-bounds neighbors of a cell for the given offset table.
pub fn neighbors(
    row: usize,
    col: usize,
    offsets: &[(isize, isize)],
    rows: usize,
    cols: usize,
) -> impl Iterator<Item = (usize, usize)> + '_ {
    offsets
        .iter()
        .filter_map(move |&d| offset(row, col, d, rows, cols))
}

/// Chebyshev distance between two cells.
#[inline]
pub fn chebyshev(a: (usize, usize), b: (usize, usize)) -> usize {
    a.0.abs_diff(b.0).max(a.1.abs_diff(b.1))
}

/// Manhattan distance from a cell to a fractional point.
#[inline]
pub fn manhattan_to(cell: (usize, usize), point: (f64, f64)) -> f64 {
    (cell.0 as f64 - point.0).abs() + (cell.1 as f64 - point.1).abs()
}

/// An entry of the occupancy index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Occupant {
    pub id: AnimalId,
    pub species: Species,
}

/// Spatial index from cell to the living animals standing on it.
///
/// Rows of the grid are flattened; each cell holds a short list of occupants.
#[derive(Clone, Debug)]
pub struct OccupancyIndex {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Occupant>>,
}

impl OccupancyIndex {
    /// Create an empty index for a `rows x cols` grid
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Vec::new(); rows * cols],
        }
    }

    #[inline]
    fn slot(&self, row: usize, col: usize) -> Result<usize> {
        if row < self.rows && col < self.cols {
            Ok(row * self.cols + col)
        } else {
            Err(SimError::OutOfBounds { row, col })
        }
    }

    /// Register an animal at a cell
    pub fn insert(&mut self, row: usize, col: usize, occupant: Occupant) -> Result<()> {
        let slot = self.slot(row, col)?;
        self.cells[slot].push(occupant);
        Ok(())
    }

    /// Remove an animal from a cell. Missing entries are a logic defect.
    pub fn remove(&mut self, row: usize, col: usize, id: AnimalId) -> Result<()> {
        let slot = self.slot(row, col)?;
        let cell = &mut self.cells[slot];
        match cell.iter().position(|o| o.id == id) {
            Some(pos) => {
                cell.remove(pos);
                Ok(())
            }
            None => Err(SimError::Invariant(format!(
                "animal {} missing from occupancy cell ({}, {})",
                id, row, col
            ))),
        }
    }

    /// Move an animal's entry from one cell to another
    pub fn relocate(
        &mut self,
        occupant: Occupant,
        from: (usize, usize),
        to: (usize, usize),
    ) -> Result<()> {
        self.remove(from.0, from.1, occupant.id)?;
        self.insert(to.0, to.1, occupant)
    }

    /// Animals at a cell (empty when out of bounds)
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &[Occupant] {
        match self.slot(row, col) {
            Ok(slot) => &self.cells[slot],
            Err(_) => &[],
        }
    }

    /// Whether any animal of `species` stands on the cell
    #[inline]
    pub fn has_species(&self, row: usize, col: usize, species: Species) -> bool {
        self.get(row, col).iter().any(|o| o.species == species)
    }

    /// Whether the cell is occupied at all
    #[inline]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        !self.get(row, col).is_empty()
    }

    /// All occupants within Chebyshev `radius`, center included, scanned
    /// row by row from the top-left corner.
    pub fn query_radius(&self, row: usize, col: usize, radius: usize) -> Vec<Occupant> {
        let mut results = Vec::new();
        if self.rows == 0 || self.cols == 0 {
            return results;
        }

        let r_min = row.saturating_sub(radius);
        let r_max = (row + radius).min(self.rows - 1);
        let c_min = col.saturating_sub(radius);
        let c_max = (col + radius).min(self.cols - 1);

        for r in r_min..=r_max {
            for c in c_min..=c_max {
                results.extend_from_slice(&self.cells[r * self.cols + c]);
            }
        }

        results
    }

    /// Total number of indexed animals
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// True when nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }

    /// Every `(row, col, occupant)` entry in the index
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, &Occupant)> + '_ {
        self.cells.iter().enumerate().flat_map(move |(slot, cell)| {
            let row = slot / self.cols;
            let col = slot % self.cols;
            cell.iter().map(move |o| (row, col, o))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn herbivore(id: AnimalId) -> Occupant {
        Occupant {
            id,
            species: Species::Herbivore,
        }
    }

    #[test]
    fn test_offset_bounds() {
        assert_eq!(offset(0, 0, (-1, 0), 5, 5), None);
        assert_eq!(offset(0, 0, (1, 1), 5, 5), Some((1, 1)));
        assert_eq!(offset(4, 4, (0, 1), 5, 5), None);
    }

    #[test]
    fn test_corner_has_three_neighbors() {
        let n: Vec<_> = neighbors(0, 0, &NEIGHBORS_8, 10, 10).collect();
        assert_eq!(n, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_occupancy_basic() {
        let mut index = OccupancyIndex::new(20, 20);
        index.insert(10, 5, herbivore(0)).unwrap();
        index.insert(10, 5, herbivore(1)).unwrap();
        index.insert(11, 5, herbivore(2)).unwrap();

        assert_eq!(index.get(10, 5).len(), 2);
        assert_eq!(index.get(11, 5).len(), 1);
        assert_eq!(index.get(12, 5).len(), 0);
        assert!(index.has_species(10, 5, Species::Herbivore));
        assert!(!index.has_species(10, 5, Species::Predator));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_occupancy_out_of_bounds() {
        let mut index = OccupancyIndex::new(4, 4);
        assert!(matches!(
            index.insert(4, 0, herbivore(0)),
            Err(SimError::OutOfBounds { row: 4, col: 0 })
        ));
        assert!(index.get(9, 9).is_empty());
    }

    #[test]
    fn test_relocate() {
        let mut index = OccupancyIndex::new(8, 8);
        index.insert(2, 2, herbivore(7)).unwrap();
        index.relocate(herbivore(7), (2, 2), (2, 3)).unwrap();

        assert!(index.get(2, 2).is_empty());
        assert_eq!(index.get(2, 3), &[herbivore(7)]);
    }

    #[test]
    fn test_remove_missing_is_invariant_error() {
        let mut index = OccupancyIndex::new(8, 8);
        assert!(matches!(
            index.remove(1, 1, 42),
            Err(SimError::Invariant(_))
        ));
    }

    #[test]
    fn test_query_radius() {
        let mut index = OccupancyIndex::new(30, 30);
        index.insert(10, 10, herbivore(0)).unwrap();
        index.insert(11, 10, herbivore(1)).unwrap();
        index.insert(9, 9, herbivore(2)).unwrap();
        index.insert(20, 20, herbivore(3)).unwrap();

        let ids: Vec<_> = index.query_radius(10, 10, 1).iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 0, 1]);
    }

    #[test]
    fn test_chebyshev_and_manhattan() {
        assert_eq!(chebyshev((3, 3), (4, 2)), 1);
        assert_eq!(chebyshev((0, 0), (2, 1)), 2);
        assert!((manhattan_to((1, 1), (2.5, 0.5)) - 2.0).abs() < 1e-9);
    }
}
