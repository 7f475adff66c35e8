//! Occupancy module - 8x8 bitboard snapshot of the grid
//!
//! Search code never touches the colored grid. It works on `Occupancy`, a
//! `Copy` bitboard where bit `row * 8 + col` is set iff that cell is filled,
//! so every simulated step is a value copy and no search can alias live state.

use crate::types::{GRID_CELLS, GRID_COLS, GRID_ROWS};

/// Bits of row 0
const ROW_BITS: u64 = 0xFF;

/// Bits of column 0
const COL_BITS: u64 = 0x0101_0101_0101_0101;

/// Every cell except column 0 (target of a one-step shift to the right)
const NOT_FIRST_COL: u64 = !COL_BITS;

/// Every cell except the last column (target of a one-step shift to the left)
const NOT_LAST_COL: u64 = !(COL_BITS << (GRID_COLS - 1));

/// Bit for cell (row, col). Caller guarantees the coordinate is on the board.
#[inline(always)]
pub const fn cell_bit(row: u8, col: u8) -> u64 {
    1u64 << (row as u32 * GRID_COLS as u32 + col as u32)
}

/// Mask of every cell in `row`
#[inline(always)]
pub const fn row_mask(row: u8) -> u64 {
    ROW_BITS << (row as u32 * GRID_COLS as u32)
}

/// Mask of every cell in `col`
#[inline(always)]
pub const fn col_mask(col: u8) -> u64 {
    COL_BITS << col
}

/// Cells 4-adjacent to any cell in `mask`, clipped to the board
#[inline]
pub const fn neighbors(mask: u64) -> u64 {
    (mask << GRID_COLS)
        | (mask >> GRID_COLS)
        | ((mask << 1) & NOT_FIRST_COL)
        | ((mask >> 1) & NOT_LAST_COL)
}

/// Iterate the (row, col) coordinates of the set bits of `mask`, row-major
pub fn mask_cells(mask: u64) -> impl Iterator<Item = (u8, u8)> {
    let mut rest = mask;
    std::iter::from_fn(move || {
        if rest == 0 {
            return None;
        }
        let idx = rest.trailing_zeros() as u8;
        rest &= rest - 1;
        Some((idx / GRID_COLS, idx % GRID_COLS))
    })
}

/// Filled/empty snapshot of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Occupancy(u64);

impl Occupancy {
    pub const EMPTY: Self = Self(0);
    pub const FULL: Self = Self(u64::MAX);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Build a snapshot from text rows; `#` or `X` is filled, anything else empty.
    ///
    /// Rows and characters beyond the board are ignored.
    ///
    /// ```
    /// use classic_blocks_core::Occupancy;
    ///
    /// let grid = Occupancy::from_ascii(&["#.......", ".#......"]);
    /// assert_eq!(grid.count_filled(), 2);
    /// assert_eq!(grid.get(1, 1), Some(true));
    /// ```
    pub fn from_ascii(rows: &[&str]) -> Self {
        let mut bits = 0u64;
        for (r, line) in rows.iter().take(GRID_ROWS as usize).enumerate() {
            for (c, ch) in line.chars().take(GRID_COLS as usize).enumerate() {
                if ch == '#' || ch == 'X' {
                    bits |= cell_bit(r as u8, c as u8);
                }
            }
        }
        Self(bits)
    }

    /// Is (row, col) filled? `None` if out of bounds.
    pub fn get(self, row: i8, col: i8) -> Option<bool> {
        if row < 0 || col < 0 || row >= GRID_ROWS as i8 || col >= GRID_COLS as i8 {
            return None;
        }
        Some(self.0 & cell_bit(row as u8, col as u8) != 0)
    }

    /// Is (row, col) filled? Off-board coordinates read as empty.
    pub fn is_filled(self, row: i8, col: i8) -> bool {
        self.get(row, col).unwrap_or(false)
    }

    /// Snapshot with the cells of `mask` filled
    #[inline]
    pub const fn with(self, mask: u64) -> Self {
        Self(self.0 | mask)
    }

    /// Snapshot with the cells of `mask` emptied
    #[inline]
    pub const fn without(self, mask: u64) -> Self {
        Self(self.0 & !mask)
    }

    /// Does any filled cell fall inside `mask`?
    #[inline]
    pub const fn overlaps(self, mask: u64) -> bool {
        self.0 & mask != 0
    }

    pub const fn count_filled(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn empty_mask(self) -> u64 {
        !self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn fill_ratio(self) -> f64 {
        self.count_filled() as f64 / GRID_CELLS as f64
    }

    pub fn filled_in_row(self, row: u8) -> u32 {
        (self.0 & row_mask(row)).count_ones()
    }

    pub fn filled_in_col(self, col: u8) -> u32 {
        (self.0 & col_mask(col)).count_ones()
    }

    pub fn empty_in_row(self, row: u8) -> u32 {
        GRID_COLS as u32 - self.filled_in_row(row)
    }

    pub fn empty_in_col(self, col: u8) -> u32 {
        GRID_ROWS as u32 - self.filled_in_col(col)
    }

    /// Bit `r` is set iff row `r` is full
    pub fn full_rows(self) -> u8 {
        let mut rows = 0u8;
        for r in 0..GRID_ROWS {
            if self.0 & row_mask(r) == row_mask(r) {
                rows |= 1 << r;
            }
        }
        rows
    }

    /// Bit `c` is set iff column `c` is full
    pub fn full_cols(self) -> u8 {
        // AND the eight rows together: a surviving bit is a column full in every row.
        let mut acc = ROW_BITS;
        for r in 0..GRID_ROWS {
            acc &= self.0 >> (r as u32 * GRID_COLS as u32);
        }
        (acc & ROW_BITS) as u8
    }

    /// Cells of every full row and column
    pub fn full_line_mask(self) -> u64 {
        lines_mask(self.full_rows(), self.full_cols())
    }

    /// Iterate filled cells, row-major
    pub fn cells(self) -> impl Iterator<Item = (u8, u8)> {
        mask_cells(self.0)
    }
}

/// Cells covered by the rows and columns set in the two bitsets
pub fn lines_mask(rows: u8, cols: u8) -> u64 {
    let mut mask = 0u64;
    for i in 0..GRID_ROWS {
        if rows & (1 << i) != 0 {
            mask |= row_mask(i);
        }
    }
    for i in 0..GRID_COLS {
        if cols & (1 << i) != 0 {
            mask |= col_mask(i);
        }
    }
    mask
}
