//! Shapes module - piece catalog and tiered random selection
//!
//! A [`Shape`] is a trimmed boolean matrix. On construction it precomputes
//! its footprint at every anchor that keeps it on the 8x8 board, so placement
//! checks during search are a single mask test.
//!
//! [`ShapeLibrary::classic`] holds the 42 classic pieces. Each shape is put in
//! a difficulty tier by exact structural match against curated tier lists;
//! a shape on none of the lists is treated as hard.

use arrayvec::ArrayVec;

use crate::occupancy::cell_bit;
use crate::rng::SimpleRng;
use crate::types::{
    ShapeId, Tier, GRID_CELLS, GRID_COLS, GRID_ROWS, MAX_SHAPE_CELLS, MAX_SHAPE_DIM,
};

/// A shape's footprint at one anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub row: u8,
    pub col: u8,
    /// Board cells covered by the shape at this anchor
    pub mask: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("shape spans {rows}x{cols} cells, the limit is {max}x{max}", max = MAX_SHAPE_DIM)]
    TooLarge { rows: usize, cols: usize },
}

/// An immutable polyomino, trimmed to its bounding box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    rows: u8,
    cols: u8,
    /// Filled offsets from the top-left corner, row-major
    cells: ArrayVec<(u8, u8), MAX_SHAPE_CELLS>,
    /// Every on-board anchor in scan order (row-major)
    placements: ArrayVec<Placement, GRID_CELLS>,
    max_row_cells: u8,
    max_col_cells: u8,
}

impl Shape {
    /// A shape with no filled cells. It fits nowhere.
    pub fn empty() -> Self {
        Self {
            rows: 0,
            cols: 0,
            cells: ArrayVec::new(),
            placements: ArrayVec::new(),
            max_row_cells: 0,
            max_col_cells: 0,
        }
    }

    /// Build a shape from matrix rows; any non-zero entry is filled.
    ///
    /// Empty border rows and columns are trimmed first and rows may be ragged.
    /// A matrix with no filled cell yields [`Shape::empty`].
    ///
    /// ```
    /// use classic_blocks_core::Shape;
    ///
    /// let l = Shape::from_rows(&[&[0, 0, 0], &[1, 0, 0], &[1, 1, 0]]).unwrap();
    /// assert_eq!((l.rows(), l.cols()), (2, 2));
    /// assert_eq!(l.cell_count(), 3);
    /// ```
    pub fn from_rows(matrix: &[&[u8]]) -> Result<Self, ShapeError> {
        let filled = |r: usize, c: usize| matrix[r].get(c).is_some_and(|&v| v != 0);

        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (r, row) in matrix.iter().enumerate() {
            for c in 0..row.len() {
                if !filled(r, c) {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (r, r, c, c),
                    Some((r0, r1, c0, c1)) => (r0.min(r), r1.max(r), c0.min(c), c1.max(c)),
                });
            }
        }

        let Some((r0, r1, c0, c1)) = bounds else {
            return Ok(Self::empty());
        };
        let rows = r1 - r0 + 1;
        let cols = c1 - c0 + 1;
        if rows > MAX_SHAPE_DIM as usize || cols > MAX_SHAPE_DIM as usize {
            return Err(ShapeError::TooLarge { rows, cols });
        }

        let mut cells = ArrayVec::new();
        for r in r0..=r1 {
            for c in c0..=c1 {
                if filled(r, c) {
                    cells.push(((r - r0) as u8, (c - c0) as u8));
                }
            }
        }

        Ok(Self::from_cells(rows as u8, cols as u8, cells))
    }

    fn from_cells(rows: u8, cols: u8, cells: ArrayVec<(u8, u8), MAX_SHAPE_CELLS>) -> Self {
        let mut per_row = [0u8; MAX_SHAPE_DIM as usize];
        let mut per_col = [0u8; MAX_SHAPE_DIM as usize];
        for &(r, c) in &cells {
            per_row[r as usize] += 1;
            per_col[c as usize] += 1;
        }

        let mut placements = ArrayVec::new();
        for row in 0..=(GRID_ROWS - rows) {
            for col in 0..=(GRID_COLS - cols) {
                let mask = cells
                    .iter()
                    .fold(0u64, |m, &(dr, dc)| m | cell_bit(row + dr, col + dc));
                placements.push(Placement { row, col, mask });
            }
        }

        Self {
            rows,
            cols,
            cells,
            placements,
            max_row_cells: per_row.iter().copied().max().unwrap_or(0),
            max_col_cells: per_col.iter().copied().max().unwrap_or(0),
        }
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    /// Filled offsets from the top-left corner
    pub fn cells(&self) -> &[(u8, u8)] {
        &self.cells
    }

    pub fn cell_count(&self) -> u32 {
        self.cells.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All anchors that keep the shape on the board, row-major
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Most filled cells the shape puts into any single row
    pub fn max_cells_per_row(&self) -> u8 {
        self.max_row_cells
    }

    /// Most filled cells the shape puts into any single column
    pub fn max_cells_per_col(&self) -> u8 {
        self.max_col_cells
    }

    /// Footprint at anchor (row, col), or `None` if any cell would leave the board
    pub fn mask_at(&self, row: i8, col: i8) -> Option<u64> {
        self.placement_at(row, col).map(|p| p.mask)
    }

    pub fn placement_at(&self, row: i8, col: i8) -> Option<Placement> {
        if self.is_empty() || row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as u8, col as u8);
        if row > GRID_ROWS - self.rows || col > GRID_COLS - self.cols {
            return None;
        }
        let span = (GRID_COLS - self.cols + 1) as usize;
        self.placements
            .get(row as usize * span + col as usize)
            .copied()
    }

    /// Every cell of the bounding box is filled
    pub fn is_solid_rectangle(&self) -> bool {
        !self.is_empty() && self.cells.len() == self.rows as usize * self.cols as usize
    }
}

type Pattern = &'static [&'static [u8]];

const SINGLE: Pattern = &[&[1]];
const SQUARE: Pattern = &[&[1, 1], &[1, 1]];
const H2: Pattern = &[&[1, 1]];
const V2: Pattern = &[&[1], &[1]];
const H3: Pattern = &[&[1, 1, 1]];
const V3: Pattern = &[&[1], &[1], &[1]];
const S_H: Pattern = &[&[1, 1, 0], &[0, 1, 1]];
const Z_H: Pattern = &[&[0, 1, 1], &[1, 1, 0]];
const S_V: Pattern = &[&[1, 0], &[1, 1], &[0, 1]];
const Z_V: Pattern = &[&[0, 1], &[1, 1], &[1, 0]];
const T_DOWN: Pattern = &[&[1, 1, 1], &[0, 1, 0]];
const T_UP: Pattern = &[&[0, 1, 0], &[1, 1, 1]];
const T_RIGHT: Pattern = &[&[1, 0], &[1, 1], &[1, 0]];
const T_LEFT: Pattern = &[&[0, 1], &[1, 1], &[0, 1]];
const SMALL_L: [Pattern; 4] = [
    &[&[1, 0], &[1, 1]],
    &[&[0, 1], &[1, 1]],
    &[&[1, 1], &[1, 0]],
    &[&[1, 1], &[0, 1]],
];
const MEDIUM_L: [Pattern; 8] = [
    &[&[1, 0, 0], &[1, 1, 1]],
    &[&[0, 0, 1], &[1, 1, 1]],
    &[&[1, 1, 1], &[1, 0, 0]],
    &[&[1, 1, 1], &[0, 0, 1]],
    &[&[1, 0], &[1, 0], &[1, 1]],
    &[&[0, 1], &[0, 1], &[1, 1]],
    &[&[1, 1], &[1, 0], &[1, 0]],
    &[&[1, 1], &[0, 1], &[0, 1]],
];
const PLUS: Pattern = &[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0]];
const BIG_L: [Pattern; 4] = [
    &[&[1, 0, 0], &[1, 0, 0], &[1, 1, 1]],
    &[&[0, 0, 1], &[0, 0, 1], &[1, 1, 1]],
    &[&[1, 1, 1], &[0, 0, 1], &[0, 0, 1]],
    &[&[1, 1, 1], &[1, 0, 0], &[1, 0, 0]],
];
const RECT_2X3: Pattern = &[&[1, 1, 1], &[1, 1, 1]];
const RECT_3X2: Pattern = &[&[1, 1], &[1, 1], &[1, 1]];
const FULL_SQUARE: Pattern = &[&[1, 1, 1], &[1, 1, 1], &[1, 1, 1]];
const LONG4_H: Pattern = &[&[1, 1, 1, 1]];
const LONG4_V: Pattern = &[&[1], &[1], &[1], &[1]];
const LONG5_H: Pattern = &[&[1, 1, 1, 1, 1]];
const LONG5_V: Pattern = &[&[1], &[1], &[1], &[1], &[1]];
const DIAG2: [Pattern; 2] = [&[&[1, 0], &[0, 1]], &[&[0, 1], &[1, 0]]];
const DIAG3: [Pattern; 2] = [
    &[&[1, 0, 0], &[0, 1, 0], &[0, 0, 1]],
    &[&[0, 0, 1], &[0, 1, 0], &[1, 0, 0]],
];

/// The classic catalog, in dealing order
#[rustfmt::skip]
const CLASSIC: [Pattern; 42] = [
    SINGLE, SQUARE, H2, V2, H3, V3,
    S_H, Z_H, S_V, Z_V,
    T_DOWN, T_UP, T_RIGHT, T_LEFT,
    SMALL_L[0], SMALL_L[1], SMALL_L[2], SMALL_L[3],
    MEDIUM_L[0], MEDIUM_L[1], MEDIUM_L[2], MEDIUM_L[3],
    MEDIUM_L[4], MEDIUM_L[5], MEDIUM_L[6], MEDIUM_L[7],
    PLUS,
    BIG_L[0], BIG_L[1], BIG_L[2], BIG_L[3],
    RECT_2X3, RECT_3X2, FULL_SQUARE,
    LONG4_H, LONG4_V, LONG5_H, LONG5_V,
    DIAG2[0], DIAG2[1], DIAG3[0], DIAG3[1],
];

#[rustfmt::skip]
const EASY: [Pattern; 12] = [
    SINGLE, SQUARE, H2, V2, H3, V3,
    SMALL_L[0], SMALL_L[1], SMALL_L[2], SMALL_L[3],
    DIAG2[0], DIAG2[1],
];

#[rustfmt::skip]
const MEDIUM: [Pattern; 20] = [
    S_H, Z_H, S_V, Z_V, T_DOWN, T_UP, T_RIGHT, T_LEFT,
    LONG4_H, LONG4_V, RECT_2X3, RECT_3X2,
    MEDIUM_L[0], MEDIUM_L[1], MEDIUM_L[2], MEDIUM_L[3],
    MEDIUM_L[4], MEDIUM_L[5], MEDIUM_L[6], MEDIUM_L[7],
];

#[rustfmt::skip]
const HARD: [Pattern; 10] = [
    DIAG3[0], DIAG3[1], FULL_SQUARE, LONG5_H, LONG5_V, PLUS,
    BIG_L[0], BIG_L[1], BIG_L[2], BIG_L[3],
];

fn pattern_matches(pattern: Pattern, shape: &Shape) -> bool {
    Shape::from_rows(pattern).is_ok_and(|p| p == *shape)
}

const TIER_LISTS: [(Tier, &[Pattern]); 3] = [
    (Tier::Easy, &EASY),
    (Tier::Medium, &MEDIUM),
    (Tier::Hard, &HARD),
];

/// Tier of a shape by exact structural match; unlisted shapes are hard
pub fn classify_tier(shape: &Shape) -> Tier {
    TIER_LISTS
        .iter()
        .find(|(_, list)| list.iter().any(|p| pattern_matches(p, shape)))
        .map_or(Tier::Hard, |(tier, _)| *tier)
}

/// A fixed catalog of shapes with tier buckets
#[derive(Debug, Clone)]
pub struct ShapeLibrary {
    shapes: Vec<Shape>,
    tiers: Vec<Tier>,
    by_tier: [Vec<ShapeId>; 3],
}

impl ShapeLibrary {
    /// Build a library from shapes, classifying each into a tier.
    ///
    /// Only the first 256 shapes are kept, the most a [`ShapeId`] can address.
    pub fn new(shapes: Vec<Shape>) -> Self {
        let shapes: Vec<Shape> = shapes.into_iter().take(u8::MAX as usize + 1).collect();
        let tiers: Vec<Tier> = shapes.iter().map(classify_tier).collect();
        let mut by_tier: [Vec<ShapeId>; 3] = Default::default();
        for (idx, tier) in tiers.iter().enumerate() {
            by_tier[tier.index()].push(ShapeId(idx as u8));
        }
        Self {
            shapes,
            tiers,
            by_tier,
        }
    }

    /// The 42-piece classic catalog
    pub fn classic() -> Self {
        let shapes = CLASSIC
            .iter()
            .map(|p| Shape::from_rows(p).unwrap_or_else(|_| Shape::empty()))
            .collect();
        Self::new(shapes)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.index())
    }

    /// Every id in catalog order
    pub fn ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        (0..self.shapes.len()).map(|i| ShapeId(i as u8))
    }

    /// `(id, shape)` pairs in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &Shape)> + '_ {
        self.shapes
            .iter()
            .enumerate()
            .map(|(i, s)| (ShapeId(i as u8), s))
    }

    pub fn tier_of(&self, id: ShapeId) -> Option<Tier> {
        self.tiers.get(id.index()).copied()
    }

    pub fn tier_members(&self, tier: Tier) -> &[ShapeId] {
        &self.by_tier[tier.index()]
    }

    /// Id of a shape structurally equal to `shape`
    pub fn find(&self, shape: &Shape) -> Option<ShapeId> {
        self.shapes
            .iter()
            .position(|s| s == shape)
            .map(|i| ShapeId(i as u8))
    }

    /// Uniformly random shape
    pub fn random_shape(&self, rng: &mut SimpleRng) -> Option<ShapeId> {
        if self.shapes.is_empty() {
            return None;
        }
        Some(ShapeId(rng.next_range(self.shapes.len() as u32) as u8))
    }

    /// Pick a tier by `weights` (`[easy, medium, hard]`), then a uniform shape in it.
    ///
    /// Weights are renormalized over the non-empty tiers. If every non-empty
    /// tier has zero weight the pick falls back to a uniform shape.
    pub fn weighted_random_shape(&self, rng: &mut SimpleRng, weights: [u32; 3]) -> Option<ShapeId> {
        let live: ArrayVec<Tier, 3> = Tier::ALL
            .into_iter()
            .filter(|t| !self.by_tier[t.index()].is_empty())
            .collect();
        let total: u32 = live.iter().map(|t| weights[t.index()]).sum();
        if total == 0 {
            return self.random_shape(rng);
        }

        let mut roll = rng.next_range(total);
        for tier in live {
            let weight = weights[tier.index()];
            if roll < weight {
                let pool = &self.by_tier[tier.index()];
                return rng.choose(pool).copied();
            }
            roll -= weight;
        }
        None
    }
}

impl Default for ShapeLibrary {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_empty_borders() {
        let shape = Shape::from_rows(&[&[0, 0, 0], &[0, 1, 1], &[0, 0, 0]]).unwrap();
        assert_eq!(shape.rows(), 1);
        assert_eq!(shape.cols(), 2);
        assert_eq!(shape.cells(), &[(0, 0), (0, 1)]);
    }

    #[test]
    fn empty_matrix_is_unplaceable() {
        let shape = Shape::from_rows(&[]).unwrap();
        assert!(shape.is_empty());
        assert!(shape.placements().is_empty());
        assert_eq!(shape.mask_at(0, 0), None);

        let zeros = Shape::from_rows(&[&[0, 0], &[0]]).unwrap();
        assert_eq!(zeros, Shape::empty());
    }

    #[test]
    fn oversized_matrix_is_rejected() {
        let err = Shape::from_rows(&[&[1, 1, 1, 1, 1, 1]]).unwrap_err();
        assert_eq!(err, ShapeError::TooLarge { rows: 1, cols: 6 });
    }

    #[test]
    fn placements_cover_every_on_board_anchor() {
        let single = Shape::from_rows(SINGLE).unwrap();
        assert_eq!(single.placements().len(), 64);

        let full = Shape::from_rows(FULL_SQUARE).unwrap();
        assert_eq!(full.placements().len(), 36);

        let long5 = Shape::from_rows(LONG5_H).unwrap();
        assert_eq!(long5.placements().len(), 8 * 4);
    }

    #[test]
    fn placement_at_matches_scan_order() {
        let bar = Shape::from_rows(H3).unwrap();
        let p = bar.placement_at(2, 5).unwrap();
        assert_eq!((p.row, p.col), (2, 5));
        assert_eq!(p.mask, cell_bit(2, 5) | cell_bit(2, 6) | cell_bit(2, 7));
        assert_eq!(bar.placement_at(2, 6), None);
        assert_eq!(bar.placement_at(-1, 0), None);
    }

    #[test]
    fn line_extents_are_tracked() {
        let l = Shape::from_rows(BIG_L[0]).unwrap();
        assert_eq!(l.max_cells_per_row(), 3);
        assert_eq!(l.max_cells_per_col(), 3);

        let diag = Shape::from_rows(DIAG3[0]).unwrap();
        assert_eq!(diag.max_cells_per_row(), 1);
        assert_eq!(diag.max_cells_per_col(), 1);
    }

    #[test]
    fn classic_catalog_tiers_every_shape() {
        let lib = ShapeLibrary::classic();
        assert_eq!(lib.len(), 42);
        assert!(lib.iter().all(|(_, s)| !s.is_empty()));
        assert_eq!(lib.tier_members(Tier::Easy).len(), 12);
        assert_eq!(lib.tier_members(Tier::Medium).len(), 20);
        assert_eq!(lib.tier_members(Tier::Hard).len(), 10);
    }

    #[test]
    fn find_locates_structurally_equal_shapes() {
        let lib = ShapeLibrary::classic();
        // Padding is trimmed before comparing.
        let padded = Shape::from_rows(&[&[0, 0, 0], &[1, 1, 1], &[0, 0, 0]]).unwrap();
        assert_eq!(lib.find(&padded), Some(ShapeId(4)));
        assert_eq!(lib.find(&Shape::from_rows(LONG4_V).unwrap()), Some(ShapeId(35)));
        assert_eq!(lib.find(&Shape::from_rows(&[&[1, 0, 1]]).unwrap()), None);
        assert_eq!(lib.find(&Shape::empty()), None);
    }

    #[test]
    fn unlisted_shape_defaults_to_hard() {
        let odd = Shape::from_rows(&[&[1, 0, 1]]).unwrap();
        assert_eq!(classify_tier(&odd), Tier::Hard);
        let single = Shape::from_rows(&[&[0], &[1]]).unwrap();
        assert_eq!(classify_tier(&single), Tier::Easy);
    }

    #[test]
    fn weighted_pick_skips_empty_tiers() {
        let lib = ShapeLibrary::new(vec![Shape::from_rows(PLUS).unwrap()]);
        let mut rng = SimpleRng::new(7);
        for _ in 0..20 {
            assert_eq!(lib.weighted_random_shape(&mut rng, [40, 35, 25]), Some(ShapeId(0)));
        }
    }

    #[test]
    fn weighted_pick_respects_zero_weights() {
        let lib = ShapeLibrary::classic();
        let mut rng = SimpleRng::new(99);
        for _ in 0..200 {
            let id = lib.weighted_random_shape(&mut rng, [0, 0, 1]).unwrap();
            assert_eq!(lib.tier_of(id), Some(Tier::Hard));
        }
    }
}
