//! 3+3 board clears: an opening tray that fills cavities, then a finishing
//! tray that empties the board

use arrayvec::ArrayVec;
use tracing::debug;

use classic_blocks_core::config::SearchLimits;
use classic_blocks_core::occupancy::Occupancy;
use classic_blocks_core::oracle::{
    exact_cavity_matches, find_cavities, find_matchable_cavities, legal_placements,
    shape_can_fit_anywhere, simulate_clear_lines, CavityMatch,
};
use classic_blocks_core::shapes::ShapeLibrary;
use classic_blocks_core::tracker::PerfectPlan;
use classic_blocks_core::types::{ShapeId, TRAY_SIZE};

/// Look for an opening of three distinct cavity-filling shapes after which
/// at most three more pieces empty the board.
///
/// Cavities are taken smallest first; only the first `perfect_cavity_window`
/// that some shape fills exactly are combined, and at most
/// `perfect_pair_attempts` triples are tried.
pub fn check_board_solvable_in_six(
    library: &ShapeLibrary,
    grid: Occupancy,
    limits: &SearchLimits,
) -> Option<PerfectPlan> {
    if grid.is_empty() {
        return None;
    }

    let firsts: Vec<CavityMatch> = find_matchable_cavities(grid)
        .iter()
        .filter_map(|c| exact_cavity_matches(library, c, grid).into_iter().next())
        .collect();
    if firsts.len() < TRAY_SIZE {
        return None;
    }

    let window = firsts.len().min(limits.perfect_cavity_window);
    let finish_depth = limits.perfect_finish_depth.min(TRAY_SIZE);
    let mut attempts = 0;
    for i in 0..window {
        for j in i + 1..window {
            for k in j + 1..window {
                if attempts >= limits.perfect_pair_attempts {
                    return None;
                }
                attempts += 1;

                let trio = [firsts[i], firsts[j], firsts[k]];
                let opening = trio.map(|m| m.shape);
                if opening[0] == opening[1]
                    || opening[0] == opening[2]
                    || opening[1] == opening[2]
                {
                    continue;
                }
                let Some(board) = play_opening(library, grid, &trio) else {
                    continue;
                };

                let finish = if board.is_empty() {
                    ArrayVec::new()
                } else {
                    match clear_board_with_n_pieces(library, board, finish_depth) {
                        Some(pieces) => pieces.into_iter().collect(),
                        None => continue,
                    }
                };
                debug!(
                    attempts,
                    finish_pieces = finish.len(),
                    "perfect sequence planned"
                );
                return Some(PerfectPlan {
                    opening,
                    board_after_opening: board,
                    finish,
                });
            }
        }
    }
    None
}

/// Place each match at its planned anchor, or the first legal anchor once an
/// earlier clear has moved things, clearing lines after every piece.
fn play_opening(
    library: &ShapeLibrary,
    grid: Occupancy,
    trio: &[CavityMatch; TRAY_SIZE],
) -> Option<Occupancy> {
    let mut board = grid;
    for m in trio {
        let mask = if !board.overlaps(m.placement.mask) {
            m.placement.mask
        } else {
            let shape = library.get(m.shape)?;
            legal_placements(board, shape).next()?.mask
        };
        board = simulate_clear_lines(board.with(mask));
    }
    Some(board)
}

/// Shapes that empty `grid` by filling matchable cavities exactly, at most
/// `max_pieces` of them. An already empty board needs none.
pub fn clear_board_with_n_pieces(
    library: &ShapeLibrary,
    grid: Occupancy,
    max_pieces: usize,
) -> Option<Vec<ShapeId>> {
    let mut used = Vec::with_capacity(max_pieces);
    try_fill(library, grid, &mut used, max_pieces).then_some(used)
}

fn try_fill(
    library: &ShapeLibrary,
    grid: Occupancy,
    used: &mut Vec<ShapeId>,
    max_pieces: usize,
) -> bool {
    if grid.is_empty() {
        return true;
    }
    if used.len() >= max_pieces {
        return false;
    }
    for cavity in find_matchable_cavities(grid) {
        for m in exact_cavity_matches(library, &cavity, grid) {
            used.push(m.shape);
            let next = simulate_clear_lines(grid.with(m.placement.mask));
            if try_fill(library, next, used, max_pieces) {
                return true;
            }
            used.pop();
        }
    }
    false
}

/// The finishing tray of a started sequence.
///
/// Uses the stored finish if the board is exactly where the opening left it,
/// otherwise re-solves from `grid`. Pads to a full tray in rounds: the exact
/// filler of the first cavity (scan order) not already dealt, then the first
/// placeable catalog shape. `None` if nothing finishes the board or the tray
/// cannot be filled.
pub fn perfect_finish(
    library: &ShapeLibrary,
    grid: Occupancy,
    plan: &PerfectPlan,
    limits: &SearchLimits,
) -> Option<[ShapeId; TRAY_SIZE]> {
    let mut pieces: ArrayVec<ShapeId, TRAY_SIZE> =
        if grid == plan.board_after_opening && !plan.finish.is_empty() {
            plan.finish.clone()
        } else {
            let depth = limits.perfect_finish_depth.min(TRAY_SIZE);
            clear_board_with_n_pieces(library, grid, depth)?
                .into_iter()
                .collect()
        };
    if pieces.is_empty() {
        return None;
    }

    // Each round adds one cavity filler, then one placeable shape.
    let cavities = find_cavities(grid);
    while !pieces.is_full() {
        let before = pieces.len();
        let filler = cavities.iter().find_map(|cavity| {
            exact_cavity_matches(library, cavity, grid)
                .first()
                .map(|m| m.shape)
                .filter(|id| !pieces.contains(id))
        });
        if let Some(id) = filler {
            pieces.push(id);
        }
        if !pieces.is_full() {
            let spare = library
                .iter()
                .find(|(id, shape)| !pieces.contains(id) && shape_can_fit_anywhere(grid, shape));
            if let Some((id, _)) = spare {
                pieces.push(id);
            }
        }
        if pieces.len() == before {
            break;
        }
    }

    pieces.into_inner().ok()
}
