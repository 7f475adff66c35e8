//! Tray solver - evaluate three shapes against a board
//!
//! [`simulate_tray_placement`] plays every ordering of a tray with a
//! [`PlacementPolicy`] and keeps the best-scoring ordering. It is an
//! approximation: each step commits to one anchor.
//!
//! [`can_clear_with_three_pieces`] is exact: a depth-bounded backtracking
//! search over every anchor, used to verify that a tray can clear a line.

use arrayvec::ArrayVec;

use classic_blocks_core::occupancy::Occupancy;
use classic_blocks_core::oracle::{
    count_isolated_cells, find_line_completion_gaps, find_matchable_cavities, has_full_line,
    legal_placements, shape_can_fit_anywhere, simulate_clear_lines,
};
use classic_blocks_core::shapes::Shape;
use classic_blocks_core::types::{GRID_COLS, GRID_ROWS, MAX_CLEAR_SEARCH_DEPTH, TRAY_SIZE};

use crate::policy::{BoardFeatures, PlacementPolicy, ScoredPlacement};

/// The six orderings of a three-piece tray
pub const ORDERINGS: [[usize; TRAY_SIZE]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// Ordering-level weights
pub const CELLS_FREED_POINTS: i32 = 2;
pub const ISOLATED_CELL_PENALTY: i32 = 3;
pub const TWO_LINE_BONUS: i32 = 50;
pub const THREE_LINE_BONUS: i32 = 150;
pub const FOUR_LINE_BONUS: i32 = 200;
pub const MANY_FREED_CELLS: i32 = 10;
pub const MANY_FREED_BONUS: i32 = 20;
pub const LINE_GAP_MATCH_POINTS: i32 = 50;
pub const EXACT_CAVITY_MATCH_POINTS: i32 = 30;

/// One piece placed during an ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementStep {
    /// Index of the shape in the tray passed to the solver
    pub shape_index: usize,
    pub placement: ScoredPlacement,
}

/// Best result found for a tray
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayOutcome {
    pub order: [usize; TRAY_SIZE],
    pub steps: ArrayVec<PlacementStep, TRAY_SIZE>,
    pub cleared_lines: u32,
    /// Filled cells before minus after; negative when the tray adds more than it clears
    pub cells_freed: i32,
    /// Steps that matched or covered a cavity
    pub cavity_matches: u32,
    /// Steps whose footprint filled a line gap exactly
    pub line_gap_matches: u32,
    pub exact_cavity_matches: u32,
    /// Steps that cleared at least one line
    pub line_completions: u32,
    pub isolated_cells: u32,
    pub score: i32,
    pub final_grid: Occupancy,
}

impl TrayOutcome {
    /// Steps that fitted the board: line completions, cavity matches, gap matches
    pub fn fitted_pieces(&self) -> u32 {
        self.line_completions + self.cavity_matches + self.line_gap_matches
    }
}

/// Play one ordering. `None` if some non-empty shape fits nowhere.
fn play_ordering<P: PlacementPolicy + ?Sized>(
    grid: Occupancy,
    shapes: [&Shape; TRAY_SIZE],
    order: [usize; TRAY_SIZE],
    policy: &P,
) -> Option<TrayOutcome> {
    let mut current = grid;
    let mut steps = ArrayVec::new();
    let mut placement_score = 0i32;

    for (i, &shape_index) in order.iter().enumerate() {
        let shape = shapes[shape_index];
        if shape.is_empty() {
            continue;
        }
        let upcoming: ArrayVec<&Shape, TRAY_SIZE> = order[i + 1..]
            .iter()
            .map(|&j| shapes[j])
            .filter(|s| !s.is_empty())
            .collect();

        let features = BoardFeatures::of(current);
        let chosen = policy.choose(&features, shape, &upcoming)?;
        placement_score += chosen.score;
        current = if chosen.cleared_lines > 0 {
            simulate_clear_lines(chosen.after)
        } else {
            chosen.after
        };
        steps.push(PlacementStep {
            shape_index,
            placement: chosen,
        });
    }

    let cleared_lines: u32 = steps.iter().map(|s| s.placement.cleared_lines).sum();
    let line_completions = steps.iter().filter(|s| s.placement.completes_line).count() as u32;
    let cavity_matches = steps.iter().filter(|s| s.placement.cavity_match).count() as u32;
    let line_gap_matches = steps.iter().filter(|s| s.placement.exact_gap).count() as u32;
    let exact_cavity_matches = steps.iter().filter(|s| s.placement.exact_cavity).count() as u32;
    let cells_freed = grid.count_filled() as i32 - current.count_filled() as i32;
    let isolated_cells = count_isolated_cells(current);

    let mut score = placement_score;
    score += cells_freed * CELLS_FREED_POINTS;
    score -= isolated_cells as i32 * ISOLATED_CELL_PENALTY;
    if cleared_lines >= 2 {
        score += TWO_LINE_BONUS;
    }
    if cleared_lines >= 3 {
        score += THREE_LINE_BONUS;
    }
    if cleared_lines >= 4 {
        score += FOUR_LINE_BONUS;
    }
    if cells_freed >= MANY_FREED_CELLS {
        score += MANY_FREED_BONUS;
    }
    score += line_gap_matches as i32 * LINE_GAP_MATCH_POINTS;
    score += exact_cavity_matches as i32 * EXACT_CAVITY_MATCH_POINTS;

    Some(TrayOutcome {
        order,
        steps,
        cleared_lines,
        cells_freed,
        cavity_matches,
        line_gap_matches,
        exact_cavity_matches,
        line_completions,
        isolated_cells,
        score,
        final_grid: current,
    })
}

/// Best outcome over all six orderings of `shapes`.
///
/// Orderings where some shape fits nowhere are discarded; `None` if every
/// ordering was. Empty shapes are skipped. The first ordering wins ties.
/// Any completed ordering is a candidate, including one whose score is
/// negative; there is no minimum score to beat.
pub fn simulate_tray_placement<P: PlacementPolicy + ?Sized>(
    grid: Occupancy,
    shapes: [&Shape; TRAY_SIZE],
    policy: &P,
) -> Option<TrayOutcome> {
    let mut best: Option<TrayOutcome> = None;
    for order in ORDERINGS {
        let Some(outcome) = play_ordering(grid, shapes, order, policy) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| outcome.score > b.score) {
            best = Some(outcome);
        }
    }
    best
}

/// Score one anchor the way the solver's first step would
pub fn score_placement(
    grid: Occupancy,
    shape: &Shape,
    row: i8,
    col: i8,
) -> Option<ScoredPlacement> {
    let placement = shape.placement_at(row, col)?;
    if grid.overlaps(placement.mask) {
        return None;
    }
    Some(BoardFeatures::of(grid).score(&placement))
}

/// Can some sequence of placements of `shapes` (in order, skipping allowed)
/// produce a full line? Exhaustive to depth [`MAX_CLEAR_SEARCH_DEPTH`].
pub fn can_clear_with_three_pieces(grid: Occupancy, shapes: &[&Shape]) -> bool {
    can_clear_within(grid, shapes, MAX_CLEAR_SEARCH_DEPTH)
}

/// [`can_clear_with_three_pieces`] with an explicit recursion depth.
///
/// Returns true at once if `grid` already has a full line.
pub fn can_clear_within(grid: Occupancy, shapes: &[&Shape], max_depth: usize) -> bool {
    if has_full_line(grid) {
        return true;
    }
    let depth_limit = max_depth.min(shapes.len());
    search_clear(grid, &shapes[..depth_limit])
}

fn search_clear(grid: Occupancy, shapes: &[&Shape]) -> bool {
    let Some((shape, rest)) = shapes.split_first() else {
        return false;
    };
    if !line_reachable(grid, shapes) {
        return false;
    }
    if !shape.is_empty() {
        for p in legal_placements(grid, shape) {
            let next = grid.with(p.mask);
            if has_full_line(next) || search_clear(next, rest) {
                return true;
            }
        }
    }
    search_clear(grid, rest)
}

/// Could any row or column reach full with every remaining shape helping?
fn line_reachable(grid: Occupancy, shapes: &[&Shape]) -> bool {
    let row_help: u32 = shapes.iter().map(|s| s.max_cells_per_row() as u32).sum();
    let col_help: u32 = shapes.iter().map(|s| s.max_cells_per_col() as u32).sum();
    (0..GRID_ROWS).any(|r| grid.filled_in_row(r) + row_help >= GRID_COLS as u32)
        || (0..GRID_COLS).any(|c| grid.filled_in_col(c) + col_help >= GRID_ROWS as u32)
}

/// Best fit score for `shape` over its legal anchors, `None` if it fits nowhere.
///
/// Per anchor: 50 per line cleared, 100 for filling a cavity exactly, 80 for
/// filling a line gap exactly, -20 per isolated cell left after clearing,
/// and 5 per net filled cell removed.
pub fn shape_fit_score(grid: Occupancy, shape: &Shape) -> Option<i32> {
    let cavities = find_matchable_cavities(grid);
    let gaps = find_line_completion_gaps(grid);
    let before = grid.count_filled() as i32;

    legal_placements(grid, shape)
        .map(|p| {
            let placed = grid.with(p.mask);
            let lines = placed.full_rows().count_ones() + placed.full_cols().count_ones();
            let cleared = simulate_clear_lines(placed);

            let mut score = lines as i32 * 50;
            if cavities.iter().any(|c| c.mask == p.mask) {
                score += 100;
            }
            if gaps.iter().any(|g| g.cells == p.mask) {
                score += 80;
            }
            score -= count_isolated_cells(cleared) as i32 * 20;
            score += (before - cleared.count_filled() as i32) * 5;
            score
        })
        .max()
}

/// Does any piece of `shapes` fit anywhere? An empty list counts as a move
/// (a refill is pending).
pub fn has_any_legal_move(grid: Occupancy, shapes: &[&Shape]) -> bool {
    shapes.is_empty() || shapes.iter().any(|s| shape_can_fit_anywhere(grid, s))
}
