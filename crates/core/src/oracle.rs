//! Placement oracle - pure queries over a grid snapshot
//!
//! Every function takes an [`Occupancy`] by value and returns a new value;
//! nothing here reads hidden state or mutates its input, so search code can
//! call these freely on speculative boards.
//!
//! Placements are only ever simulated at anchors that passed [`can_place`].
//! Shapes never get clipped at the board edge: an off-board anchor has no
//! footprint at all.

use crate::occupancy::{mask_cells, neighbors, Occupancy};
use crate::shapes::{Placement, Shape, ShapeLibrary};
use crate::types::{
    LineKind, ShapeId, CAVITY_COVER_PERCENT, GRID_COLS, GRID_ROWS, LINE_GAP_MAX_EMPTY,
    MATCHABLE_CAVITY_MAX, NEAR_COMPLETE_MAX_EMPTY,
};

use crate::occupancy::{col_mask, row_mask};

/// A maximal 4-connected region of empty cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cavity {
    pub mask: u64,
}

impl Cavity {
    pub fn len(&self) -> u32 {
        self.mask.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    pub fn cells(&self) -> impl Iterator<Item = (u8, u8)> {
        mask_cells(self.mask)
    }
}

/// A row or column within a few cells of completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineGap {
    pub kind: LineKind,
    pub index: u8,
    /// The empty cells of the line
    pub cells: u64,
    pub empty_count: u32,
    /// Fewer empty cells rank higher; 1-3 empty outranks 4-6
    pub priority: i32,
    pub near_complete: bool,
}

impl LineGap {
    fn new(kind: LineKind, index: u8, cells: u64) -> Self {
        let empty_count = cells.count_ones();
        let priority = if empty_count <= NEAR_COMPLETE_MAX_EMPTY {
            20 - empty_count as i32
        } else {
            10 - empty_count as i32
        };
        Self {
            kind,
            index,
            cells,
            empty_count,
            priority,
            near_complete: empty_count <= NEAR_COMPLETE_MAX_EMPTY,
        }
    }
}

/// A shape that fills a cavity exactly at one anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CavityMatch {
    pub shape: ShapeId,
    pub placement: Placement,
    pub cavity: Cavity,
}

/// Can `shape` sit with its top-left at (row, col) on `grid`?
///
/// False for empty shapes, for anchors that put any filled cell off the
/// board, and for overlaps with filled cells.
pub fn can_place(grid: Occupancy, shape: &Shape, row: i8, col: i8) -> bool {
    shape
        .mask_at(row, col)
        .is_some_and(|mask| !grid.overlaps(mask))
}

/// Fill the footprint of `shape` at (row, col).
///
/// The anchor must satisfy [`can_place`]. An off-board anchor has no
/// footprint and leaves the grid unchanged.
pub fn simulate_place(grid: Occupancy, shape: &Shape, row: i8, col: i8) -> Occupancy {
    debug_assert!(
        can_place(grid, shape, row, col),
        "simulate_place at an illegal anchor ({row}, {col})"
    );
    match shape.mask_at(row, col) {
        Some(mask) => grid.with(mask),
        None => grid,
    }
}

/// Fill a precomputed placement. The placement must not overlap `grid`.
#[inline]
pub fn apply_placement(grid: Occupancy, placement: &Placement) -> Occupancy {
    debug_assert!(!grid.overlaps(placement.mask));
    grid.with(placement.mask)
}

/// Empty every full row and column, detected on the same snapshot
pub fn simulate_clear_lines(grid: Occupancy) -> Occupancy {
    grid.without(grid.full_line_mask())
}

pub fn count_filled_cells(grid: Occupancy) -> u32 {
    grid.count_filled()
}

/// Full rows plus full columns
pub fn count_cleared_lines(grid: Occupancy) -> u32 {
    grid.full_rows().count_ones() + grid.full_cols().count_ones()
}

pub fn has_full_line(grid: Occupancy) -> bool {
    grid.full_rows() != 0 || grid.full_cols() != 0
}

/// Partition the empty cells into 4-connected cavities.
///
/// Cavities are returned in order of their first cell, row-major.
pub fn find_cavities(grid: Occupancy) -> Vec<Cavity> {
    let mut cavities = Vec::new();
    let empty = grid.empty_mask();
    let mut unvisited = empty;

    while unvisited != 0 {
        let seed = unvisited & unvisited.wrapping_neg();
        let mut region = seed;
        loop {
            let grown = (region | neighbors(region)) & empty;
            if grown == region {
                break;
            }
            region = grown;
        }
        unvisited &= !region;
        cavities.push(Cavity { mask: region });
    }

    cavities
}

/// Cavities small enough to be filled by a single shape, smallest first
pub fn find_matchable_cavities(grid: Occupancy) -> Vec<Cavity> {
    let mut cavities: Vec<Cavity> = find_cavities(grid)
        .into_iter()
        .filter(|c| (1..=MATCHABLE_CAVITY_MAX).contains(&c.len()))
        .collect();
    cavities.sort_by_key(|c| c.len());
    cavities
}

/// Every row, then every column, with 1-6 empty cells, highest priority first.
///
/// The sort is stable: equal priorities keep rows before columns and lower
/// indices first.
pub fn find_line_completion_gaps(grid: Occupancy) -> Vec<LineGap> {
    let empty = grid.empty_mask();
    let mut gaps = Vec::new();

    for r in 0..GRID_ROWS {
        let cells = empty & row_mask(r);
        if (1..=LINE_GAP_MAX_EMPTY).contains(&cells.count_ones()) {
            gaps.push(LineGap::new(LineKind::Row, r, cells));
        }
    }
    for c in 0..GRID_COLS {
        let cells = empty & col_mask(c);
        if (1..=LINE_GAP_MAX_EMPTY).contains(&cells.count_ones()) {
            gaps.push(LineGap::new(LineKind::Column, c, cells));
        }
    }

    gaps.sort_by(|a, b| b.priority.cmp(&a.priority));
    gaps
}

/// The shape's footprint at (row, col) is exactly the cavity
pub fn shape_matches_cavity(shape: &Shape, row: i8, col: i8, cavity: &Cavity) -> bool {
    shape.mask_at(row, col) == Some(cavity.mask)
}

/// The shape's footprint at (row, col) covers at least 80% of the cavity
pub fn shape_covers_cavity(shape: &Shape, row: i8, col: i8, cavity: &Cavity) -> bool {
    shape
        .mask_at(row, col)
        .is_some_and(|mask| mask_covers(mask, cavity))
}

/// At least 80% of `cavity` (rounded up) lies inside `mask`
pub fn mask_covers(mask: u64, cavity: &Cavity) -> bool {
    let covered = (mask & cavity.mask).count_ones();
    let needed = (cavity.len() * CAVITY_COVER_PERCENT).div_ceil(100);
    covered >= needed
}

/// The shape's footprint at (row, col) is exactly the gap's empty cells
pub fn shape_matches_gap(shape: &Shape, row: i8, col: i8, gap: &LineGap) -> bool {
    shape.mask_at(row, col) == Some(gap.cells)
}

/// Some on-board anchor where `shape` fits into `gap` exactly
pub fn gap_match(shape: &Shape, gap: &LineGap) -> Option<Placement> {
    shape
        .placements()
        .iter()
        .find(|p| p.mask == gap.cells)
        .copied()
}

/// Is there any anchor where `shape` fits?
pub fn shape_can_fit_anywhere(grid: Occupancy, shape: &Shape) -> bool {
    shape.placements().iter().any(|p| !grid.overlaps(p.mask))
}

/// Anchors where `shape` fits, row-major
pub fn legal_placements(grid: Occupancy, shape: &Shape) -> impl Iterator<Item = &Placement> + '_ {
    shape
        .placements()
        .iter()
        .filter(move |p| !grid.overlaps(p.mask))
}

/// Empty cells with no empty on-board neighbor
pub fn count_isolated_cells(grid: Occupancy) -> u32 {
    let empty = grid.empty_mask();
    (empty & !neighbors(empty)).count_ones()
}

/// Every (shape, anchor) in `library` that fills `cavity` exactly.
///
/// Ordered by catalog position, then anchor scan order.
pub fn exact_cavity_matches(
    library: &ShapeLibrary,
    cavity: &Cavity,
    grid: Occupancy,
) -> Vec<CavityMatch> {
    let size = cavity.len();
    let mut matches = Vec::new();
    for (id, shape) in library.iter() {
        if shape.cell_count() != size {
            continue;
        }
        for p in legal_placements(grid, shape) {
            if p.mask == cavity.mask {
                matches.push(CavityMatch {
                    shape: id,
                    placement: *p,
                    cavity: *cavity,
                });
            }
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupancy::cell_bit;

    fn shape(rows: &[&[u8]]) -> Shape {
        Shape::from_rows(rows).unwrap()
    }

    #[test]
    fn can_place_checks_bounds_and_overlap() {
        let grid = Occupancy::from_bits(cell_bit(0, 0));
        let domino = shape(&[&[1, 1]]);
        assert!(!can_place(grid, &domino, 0, 0));
        assert!(can_place(grid, &domino, 0, 1));
        assert!(!can_place(grid, &domino, 0, 7));
        assert!(!can_place(grid, &Shape::empty(), 3, 3));
    }

    #[test]
    fn clear_is_simultaneous_for_rows_and_columns() {
        let grid = Occupancy::from_bits(row_mask(0) | col_mask(0) | cell_bit(5, 5));
        let cleared = simulate_clear_lines(grid);
        assert_eq!(cleared, Occupancy::from_bits(cell_bit(5, 5)));
        assert_eq!(count_cleared_lines(grid), 2);
    }

    #[test]
    fn isolated_cell_counts_only_walled_in_cells() {
        let grid = Occupancy::from_bits(!cell_bit(3, 3) & !cell_bit(0, 0) & !cell_bit(0, 1));
        assert_eq!(count_isolated_cells(grid), 1);
        assert_eq!(count_isolated_cells(Occupancy::EMPTY), 0);
    }

    #[test]
    fn gaps_rank_near_complete_first() {
        // Row 0 has 5 empty, column 7 has 2 empty.
        let grid = Occupancy::from_bits(
            (row_mask(0) & !(0b1_1111 << 1)) | (col_mask(7) & !(cell_bit(3, 7) | cell_bit(4, 7))),
        );
        let gaps = find_line_completion_gaps(grid);
        assert_eq!(gaps[0].kind, LineKind::Column);
        assert_eq!(gaps[0].index, 7);
        assert_eq!(gaps[0].priority, 18);
        assert!(gaps[0].near_complete);

        let row0 = gaps.iter().find(|g| g.kind == LineKind::Row && g.index == 0).unwrap();
        assert_eq!(row0.empty_count, 5);
        assert_eq!(row0.priority, 5);
        assert!(!row0.near_complete);
    }

    #[test]
    fn covers_requires_eighty_percent_rounded_up() {
        // 5-cell cavity needs 4 covered cells.
        let cavity = Cavity {
            mask: row_mask(0) & 0b1_1111,
        };
        assert!(mask_covers(0b1111, &cavity));
        assert!(!mask_covers(0b111, &cavity));
    }

    #[test]
    fn shape_covers_cavity_at_the_boundary() {
        let cavity = Cavity {
            mask: row_mask(0) & 0b1_1111,
        };
        let long4 = shape(&[&[1, 1, 1, 1]]);
        let bar = shape(&[&[1, 1, 1]]);

        // ceil(0.8 * 5) = 4 cells.
        assert!(shape_covers_cavity(&long4, 0, 0, &cavity));
        assert!(shape_covers_cavity(&long4, 0, 1, &cavity));
        assert!(!shape_covers_cavity(&bar, 0, 0, &cavity));
        assert!(!shape_covers_cavity(&long4, 0, 2, &cavity));
        assert!(!shape_covers_cavity(&long4, 0, 5, &cavity));

        // ceil(0.8 * 3) = 3: a domino is one short.
        let pocket = Cavity {
            mask: cell_bit(4, 0) | cell_bit(4, 1) | cell_bit(5, 0),
        };
        assert!(!shape_covers_cavity(&shape(&[&[1, 1]]), 4, 0, &pocket));
        assert!(shape_covers_cavity(&shape(&[&[1, 1], &[1, 0]]), 4, 0, &pocket));
        assert!(shape_matches_cavity(&shape(&[&[1, 1], &[1, 0]]), 4, 0, &pocket));
    }

    #[test]
    fn exact_matches_report_anchor() {
        let lib = ShapeLibrary::classic();
        let grid = Occupancy::from_bits(!(cell_bit(6, 2) | cell_bit(6, 3)));
        let cavities = find_matchable_cavities(grid);
        assert_eq!(cavities.len(), 1);
        let matches = exact_cavity_matches(&lib, &cavities[0], grid);
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].placement.row, matches[0].placement.col), (6, 2));
        assert_eq!(lib.get(matches[0].shape).map(|s| s.cols()), Some(2));
    }
}
