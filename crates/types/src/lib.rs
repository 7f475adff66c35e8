//! Shared types and constants for the classic tray engine
//!
//! Everything here is plain data with no external dependencies, so the same
//! definitions are usable by the board model, the tray search, and any
//! frontend that drives a session.
//!
//! # Board Dimensions
//!
//! The classic board is a fixed 8x8 grid:
//!
//! - **Rows**: 8 (indexed 0-7, top to bottom)
//! - **Columns**: 8 (indexed 0-7, left to right)
//! - **Tray**: 3 slots dealt together
//!
//! # Shape Tiers
//!
//! Random shapes are drawn by first picking a tier, then a shape in that tier:
//!
//! | Tier | Weight | Typical members |
//! |------|--------|-----------------|
//! | Easy | 40 | single, dominoes, triominoes, small Ls, 2-step diagonals |
//! | Medium | 35 | T, S/Z, medium Ls, long 4, 2x3 rectangles |
//! | Hard | 25 | plus, big Ls, 3x3, long 5, 3-step diagonals |
//!
//! # Search Limits
//!
//! Every search is bounded by an iteration cap rather than a timeout:
//!
//! | Constant | Value | Bounds |
//! |----------|-------|--------|
//! | `BASELINE_ATTEMPTS` | 200 | random re-rolls while enforcing the clear guarantee |
//! | `GOOD_SAMPLE_ATTEMPTS` | 400 | random triples tried by the sampled good-tray search |
//! | `MULTI_CLEAR_PROBE_ATTEMPTS` | 100 | quick probe for 3+ line clears |
//! | `GAP_COMBO_ATTEMPTS` | 100 | combinations of gap-matching shapes |
//! | `SIMPLE_COMBO_ATTEMPTS` | 50 | random fallback in the simple-combo search |
//! | `PERFECT_PAIR_ATTEMPTS` | 100 | cavity triples tried for a 3+3 board clear |
//! | `PERFECT_CAVITY_WINDOW` | 10 | smallest cavities considered for the opening |
//! | `MAX_CLEAR_SEARCH_DEPTH` | 3 | exhaustive clear-check recursion depth |
//!
//! # Examples
//!
//! ```
//! use classic_blocks_types::{GamePhase, ShapeId, Tier, GRID_COLS, GRID_ROWS, TRAY_SIZE};
//!
//! assert_eq!(GRID_ROWS, 8);
//! assert_eq!(GRID_COLS, 8);
//! assert_eq!(TRAY_SIZE, 3);
//!
//! assert_eq!(Tier::from_str("medium"), Some(Tier::Medium));
//! assert_eq!(GamePhase::Late.as_str(), "late");
//! assert_eq!(ShapeId(4).index(), 4);
//! ```

/// Board height in cells (8 rows)
pub const GRID_ROWS: u8 = 8;

/// Board width in cells (8 columns)
pub const GRID_COLS: u8 = 8;

/// Total number of cells on the board
pub const GRID_CELLS: usize = (GRID_ROWS as usize) * (GRID_COLS as usize);

/// Number of slots in a tray
pub const TRAY_SIZE: usize = 3;

/// Number of colors in the piece palette
pub const PALETTE_SIZE: usize = 6;

/// Largest trimmed shape extent in either direction
pub const MAX_SHAPE_DIM: u8 = 5;

/// Largest number of filled cells a shape can carry
pub const MAX_SHAPE_CELLS: usize = (MAX_SHAPE_DIM as usize) * (MAX_SHAPE_DIM as usize);

/// Tier weights in `[easy, medium, hard]` order
pub const TIER_WEIGHTS: [u32; 3] = [40, 35, 25];

/// A row or column with at most this many empty cells is a line gap
pub const LINE_GAP_MAX_EMPTY: u32 = 6;

/// A line gap with at most this many empty cells is near complete
pub const NEAR_COMPLETE_MAX_EMPTY: u32 = 3;

/// Cavities larger than this are never matched against a single shape
pub const MATCHABLE_CAVITY_MAX: u32 = 9;

/// Share of a cavity (in percent) a placement must cover to count as a partial fit
pub const CAVITY_COVER_PERCENT: u32 = 80;

/// Recursion depth of the exhaustive clear check
pub const MAX_CLEAR_SEARCH_DEPTH: usize = 3;

/// Random re-rolls of the baseline generator while enforcing the guarantee
pub const BASELINE_ATTEMPTS: u32 = 200;

/// Random triples tried by the sampled good-tray search
pub const GOOD_SAMPLE_ATTEMPTS: u32 = 400;

/// Random triples tried by the 3+ line clear probe
pub const MULTI_CLEAR_PROBE_ATTEMPTS: u32 = 100;

/// Combinations tried by the gap-matching good-tray search
pub const GAP_COMBO_ATTEMPTS: u32 = 100;

/// Random triples tried by the simple-combo fallback
pub const SIMPLE_COMBO_ATTEMPTS: u32 = 50;

/// Line gaps (highest priority first) examined by the gap searches
pub const TOP_LINE_GAPS: usize = 5;

/// Cavity triples tried when planning a 3+3 board clear
pub const PERFECT_PAIR_ATTEMPTS: u32 = 100;

/// Smallest cavities considered when planning a 3+3 board clear
pub const PERFECT_CAVITY_WINDOW: usize = 10;

/// Pieces allowed to finish a board clear after the opening tray
pub const PERFECT_FINISH_DEPTH: usize = 3;

/// Palette index of a piece color (`0..PALETTE_SIZE`)
pub type ColorId = u8;

/// A board cell: empty or filled with a color
pub type Cell = Option<ColorId>;

/// Index of a shape in a shape library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u8);

impl ShapeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Difficulty tier of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

impl Tier {
    /// All tiers in weight order
    pub const ALL: [Tier; 3] = [Tier::Easy, Tier::Medium, Tier::Hard];

    pub const fn index(self) -> usize {
        match self {
            Tier::Easy => 0,
            Tier::Medium => 1,
            Tier::Hard => 2,
        }
    }

    /// Parse tier from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Tier::Easy),
            "medium" => Some(Tier::Medium),
            "hard" => Some(Tier::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Easy => "easy",
            Tier::Medium => "medium",
            Tier::Hard => "hard",
        }
    }
}

/// Game progress phase used to tune special-tray odds
///
/// Derived from the tray count and how crowded the board is. Early game
/// favors frequent good trays, late game makes them rare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    Early,
    Mid,
    Late,
}

impl GamePhase {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "early" => Some(GamePhase::Early),
            "mid" => Some(GamePhase::Mid),
            "late" => Some(GamePhase::Late),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Early => "early",
            GamePhase::Mid => "mid",
            GamePhase::Late => "late",
        }
    }
}

/// Orientation of a board line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Row,
    Column,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Row => "row",
            LineKind::Column => "column",
        }
    }
}

/// Why points were awarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreReason {
    /// Base points for the cells of a placed piece
    Placement,
    /// Points for rows/columns cleared by one placement
    LineClear,
    /// Bonus for emptying the whole board
    FullClear,
}

impl ScoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreReason::Placement => "placement",
            ScoreReason::LineClear => "line_clear",
            ScoreReason::FullClear => "full_clear",
        }
    }
}

/// Which good-tray search produced a tray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoodSearch {
    /// Exact matches for rows/columns 1-3 cells from full
    NearCompleteLines,
    /// Random all-placeable triples that clear 3+ lines
    MultiClearProbe,
    /// Combinations of shapes matching the top line gaps
    GapCombination,
    /// Random triples judged by the solver
    Sampled,
    /// Best exact cavity and gap fits
    ExactFit,
    /// Solid rectangles and squares
    SimpleCombo,
}

impl GoodSearch {
    /// Search tier, 1 (most obvious) to 3
    pub const fn tier(self) -> u8 {
        match self {
            GoodSearch::NearCompleteLines => 1,
            GoodSearch::MultiClearProbe | GoodSearch::GapCombination | GoodSearch::Sampled => 2,
            GoodSearch::ExactFit | GoodSearch::SimpleCombo => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoodSearch::NearCompleteLines => "near_complete_lines",
            GoodSearch::MultiClearProbe => "multi_clear_probe",
            GoodSearch::GapCombination => "gap_combination",
            GoodSearch::Sampled => "sampled",
            GoodSearch::ExactFit => "exact_fit",
            GoodSearch::SimpleCombo => "simple_combo",
        }
    }
}

/// How a tray was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrayKind {
    /// Weighted random sampling
    Baseline,
    Good(GoodSearch),
    /// First half of a 3+3 board clear
    PerfectOpening,
    /// Second half of a 3+3 board clear
    PerfectFinish,
}

impl TrayKind {
    pub fn is_special(&self) -> bool {
        !matches!(self, TrayKind::Baseline)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrayKind::Baseline => "baseline",
            TrayKind::Good(_) => "good",
            TrayKind::PerfectOpening => "perfect_opening",
            TrayKind::PerfectFinish => "perfect_finish",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_board_defaults() {
        assert_eq!(GRID_CELLS, 64);
        assert_eq!(TRAY_SIZE, 3);
        assert_eq!(PALETTE_SIZE, 6);
        assert_eq!(TIER_WEIGHTS.iter().sum::<u32>(), 100);
    }

    #[test]
    fn tier_round_trips_through_str() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_str(tier.as_str()), Some(tier));
        }
        assert_eq!(Tier::from_str("HARD"), Some(Tier::Hard));
        assert_eq!(Tier::from_str("extreme"), None);
    }

    #[test]
    fn tier_index_matches_weight_order() {
        assert_eq!(Tier::Easy.index(), 0);
        assert_eq!(Tier::Medium.index(), 1);
        assert_eq!(Tier::Hard.index(), 2);
    }

    #[test]
    fn good_search_tiers() {
        assert_eq!(GoodSearch::NearCompleteLines.tier(), 1);
        assert_eq!(GoodSearch::Sampled.tier(), 2);
        assert_eq!(GoodSearch::SimpleCombo.tier(), 3);
        assert!(TrayKind::Good(GoodSearch::ExactFit).is_special());
        assert!(!TrayKind::Baseline.is_special());
    }

    #[test]
    fn phase_parses_case_insensitively() {
        assert_eq!(GamePhase::from_str("Early"), Some(GamePhase::Early));
        assert_eq!(GamePhase::from_str("mid"), Some(GamePhase::Mid));
        assert_eq!(GamePhase::from_str("LATE"), Some(GamePhase::Late));
        assert_eq!(GamePhase::from_str("endgame"), None);
    }
}
