//! Grid module - the live 8x8 board
//!
//! Each cell is empty or filled with a palette color. Storage is a flat
//! row-major array, so the whole board is one fixed-size value.
//! Coordinates are (row, col) with row 0 at the top.
//!
//! The grid is only mutated by committed placements and line clears; search
//! code works on the [`Occupancy`] projection instead.

use crate::occupancy::{lines_mask, mask_cells, Occupancy};
use crate::shapes::Shape;
use crate::types::{Cell, ColorId, GRID_CELLS, GRID_COLS, GRID_ROWS};

/// Rows and columns removed by one clear, as bitsets (bit `i` = line `i`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearedLines {
    pub rows: u8,
    pub cols: u8,
}

impl ClearedLines {
    /// Total lines cleared (rows + columns)
    pub fn count(self) -> u32 {
        self.rows.count_ones() + self.cols.count_ones()
    }

    pub fn is_empty(self) -> bool {
        self.rows == 0 && self.cols == 0
    }

    /// Indices of the cleared rows, top to bottom
    pub fn row_indices(self) -> impl Iterator<Item = u8> {
        (0..GRID_ROWS).filter(move |r| self.rows & (1 << r) != 0)
    }

    /// Indices of the cleared columns, left to right
    pub fn col_indices(self) -> impl Iterator<Item = u8> {
        (0..GRID_COLS).filter(move |c| self.cols & (1 << c) != 0)
    }
}

/// The game board - 8 rows x 8 columns of colored cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Flat array of cells, row-major order (row * COLS + col)
    cells: [Cell; GRID_CELLS],
}

impl Grid {
    pub fn new() -> Self {
        Self {
            cells: [None; GRID_CELLS],
        }
    }

    #[inline(always)]
    fn index(row: i8, col: i8) -> Option<usize> {
        if row < 0 || row >= GRID_ROWS as i8 || col < 0 || col >= GRID_COLS as i8 {
            return None;
        }
        Some((row as usize) * (GRID_COLS as usize) + (col as usize))
    }

    pub fn rows(&self) -> u8 {
        GRID_ROWS
    }

    pub fn cols(&self) -> u8 {
        GRID_COLS
    }

    /// Get cell at (row, col)
    /// Returns None if out of bounds
    pub fn get(&self, row: i8, col: i8) -> Option<Cell> {
        Self::index(row, col).map(|idx| self.cells[idx])
    }

    /// Set cell at (row, col)
    /// Returns false if out of bounds
    pub fn set(&mut self, row: i8, col: i8, cell: Cell) -> bool {
        match Self::index(row, col) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// In bounds and empty
    pub fn is_empty_at(&self, row: i8, col: i8) -> bool {
        matches!(self.get(row, col), Some(None))
    }

    /// Project the colored board onto a filled/empty bitboard
    pub fn occupancy(&self) -> Occupancy {
        let mut bits = 0u64;
        for (idx, cell) in self.cells.iter().enumerate() {
            if cell.is_some() {
                bits |= 1u64 << idx;
            }
        }
        Occupancy::from_bits(bits)
    }

    pub fn filled_count(&self) -> u32 {
        self.cells.iter().filter(|c| c.is_some()).count() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    /// Share of filled cells, 0.0 (empty) to 1.0 (full)
    pub fn fill_ratio(&self) -> f64 {
        self.filled_count() as f64 / GRID_CELLS as f64
    }

    /// Stamp `shape` with its top-left at (row, col).
    ///
    /// Returns false without touching the board if any filled cell of the
    /// shape would land off the board or on a filled cell.
    pub fn place(&mut self, shape: &Shape, row: i8, col: i8, color: ColorId) -> bool {
        let Some(mask) = shape.mask_at(row, col) else {
            return false;
        };
        if self.occupancy().overlaps(mask) {
            return false;
        }
        for (r, c) in mask_cells(mask) {
            self.cells[(r as usize) * (GRID_COLS as usize) + (c as usize)] = Some(color);
        }
        true
    }

    /// Empty every full row and column at once.
    ///
    /// Rows and columns are detected on the same snapshot, so a cell at the
    /// crossing of a full row and a full column is cleared either way.
    pub fn clear_full_lines(&mut self) -> ClearedLines {
        let occupancy = self.occupancy();
        let cleared = ClearedLines {
            rows: occupancy.full_rows(),
            cols: occupancy.full_cols(),
        };
        if cleared.is_empty() {
            return cleared;
        }
        for (r, c) in mask_cells(lines_mask(cleared.rows, cleared.cols)) {
            self.cells[(r as usize) * (GRID_COLS as usize) + (c as usize)] = None;
        }
        cleared
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells = [None; GRID_CELLS];
    }

    /// Build a board from an occupancy snapshot, painting every filled cell `color`
    pub fn from_occupancy(occupancy: Occupancy, color: ColorId) -> Self {
        let mut grid = Self::new();
        for (r, c) in occupancy.cells() {
            grid.cells[(r as usize) * (GRID_COLS as usize) + (c as usize)] = Some(color);
        }
        grid
    }

    /// Build a board from text rows (`#` or `X` filled), painted `color`
    pub fn from_rows(rows: &[&str], color: ColorId) -> Self {
        Self::from_occupancy(Occupancy::from_ascii(rows), color)
    }

    /// Rows as palette codes: 0 = empty, `color + 1` otherwise
    pub fn to_codes(&self) -> [[u8; GRID_COLS as usize]; GRID_ROWS as usize] {
        let mut out = [[0u8; GRID_COLS as usize]; GRID_ROWS as usize];
        for (idx, cell) in self.cells.iter().enumerate() {
            if let Some(color) = cell {
                out[idx / GRID_COLS as usize][idx % GRID_COLS as usize] = color.saturating_add(1);
            }
        }
        out
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single() -> Shape {
        Shape::from_rows(&[&[1]]).unwrap()
    }

    #[test]
    fn place_writes_color_and_rejects_overlap() {
        let mut grid = Grid::new();
        assert!(grid.place(&single(), 2, 3, 4));
        assert_eq!(grid.get(2, 3), Some(Some(4)));
        assert!(!grid.place(&single(), 2, 3, 1));
        assert_eq!(grid.get(2, 3), Some(Some(4)));
    }

    #[test]
    fn place_rejects_out_of_bounds_without_mutation() {
        let mut grid = Grid::new();
        let bar = Shape::from_rows(&[&[1, 1, 1]]).unwrap();
        assert!(!grid.place(&bar, 0, 6, 0));
        assert!(!grid.place(&bar, -1, 0, 0));
        assert!(grid.is_empty());
    }

    #[test]
    fn clear_removes_crossing_row_and_column() {
        let mut grid = Grid::new();
        for i in 0..8 {
            grid.set(4, i, Some(0));
            grid.set(i, 6, Some(1));
        }
        grid.set(0, 0, Some(2));

        let cleared = grid.clear_full_lines();
        assert_eq!(cleared.count(), 2);
        assert_eq!(cleared.row_indices().collect::<Vec<_>>(), vec![4]);
        assert_eq!(cleared.col_indices().collect::<Vec<_>>(), vec![6]);
        assert_eq!(grid.filled_count(), 1);
        assert_eq!(grid.get(0, 0), Some(Some(2)));
    }

    #[test]
    fn occupancy_matches_cells() {
        let mut grid = Grid::new();
        grid.set(7, 7, Some(5));
        grid.set(0, 1, Some(0));
        let occ = grid.occupancy();
        assert_eq!(occ.count_filled(), 2);
        assert_eq!(occ.get(7, 7), Some(true));
        assert_eq!(occ.get(0, 1), Some(true));
    }

    #[test]
    fn is_empty_at_needs_an_empty_on_board_cell() {
        let mut grid = Grid::new();
        grid.set(3, 4, Some(0));
        assert!(!grid.is_empty_at(3, 4));
        assert!(grid.is_empty_at(3, 5));
        assert!(grid.is_empty_at(7, 7));
        assert!(!grid.is_empty_at(8, 0));
        assert!(!grid.is_empty_at(0, -1));
    }

    #[test]
    fn codes_offset_colors_by_one() {
        let mut grid = Grid::new();
        grid.set(1, 2, Some(0));
        let codes = grid.to_codes();
        assert_eq!(codes[1][2], 1);
        assert_eq!(codes[0][0], 0);
    }
}
