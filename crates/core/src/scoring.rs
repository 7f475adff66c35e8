//! Scoring module - points for placements, line clears, and board clears
//!
//! All functions are pure. The combo streak they read is owned by
//! [`GameTracker`](crate::tracker::GameTracker), which also decides when the
//! streak grows or resets.
//!
//! Line points always use the streak from *before* the clear that earns them.

use crate::config::{LineClearFormula, ScoringRules};

/// Points for one placement and the clear it caused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    /// One point per cell of the placed piece
    pub placement: u32,
    pub line_clear: u32,
    pub full_clear: u32,
    pub total: u32,
}

/// Base points for placing a piece of `cells` cells
pub fn placement_points(cells: u32) -> u32 {
    cells
}

/// Stepped per-line points for a combo streak.
///
/// 45 with no streak, 45 more per streak level up to 180, then a jump to 280
/// at streak 4 and +70 per level beyond.
pub fn stepped_points_per_line(combo: u32) -> u32 {
    match combo {
        0 => 45,
        1..=3 => 45 * (combo + 1),
        4 => 280,
        _ => 280u32.saturating_add(70u32.saturating_mul(combo - 4)),
    }
}

/// `24 * 4^(lines - 1) * (combo + 1)`
pub fn exponential_line_points(lines: u32, combo: u32) -> u32 {
    if lines == 0 {
        return 0;
    }
    let base = 4u32.checked_pow(lines - 1).unwrap_or(u32::MAX);
    24u32
        .saturating_mul(base)
        .saturating_mul(combo.saturating_add(1))
}

/// Points for clearing `lines` lines at once with streak `combo`
pub fn line_clear_points(formula: LineClearFormula, lines: u32, combo: u32) -> u32 {
    if lines == 0 {
        return 0;
    }
    match formula {
        LineClearFormula::Stepped => stepped_points_per_line(combo).saturating_mul(lines),
        LineClearFormula::Exponential => exponential_line_points(lines, combo),
    }
}

/// Bonus for emptying the board, a multiple of the line points just earned
pub fn full_clear_bonus(rules: &ScoringRules, line_points: u32) -> u32 {
    line_points.saturating_mul(rules.full_clear_multiplier)
}

/// Score one placement.
///
/// `board_empty` is whether the board is empty after the clear; it only pays
/// out when this placement cleared at least one line.
pub fn calculate_score(
    rules: &ScoringRules,
    cells: u32,
    lines: u32,
    combo: u32,
    board_empty: bool,
) -> ScoreResult {
    let placement = placement_points(cells);
    let line_clear = line_clear_points(rules.formula, lines, combo);
    let full_clear = if lines > 0 && board_empty {
        full_clear_bonus(rules, line_clear)
    } else {
        0
    };
    ScoreResult {
        placement,
        line_clear,
        full_clear,
        total: placement.saturating_add(line_clear).saturating_add(full_clear),
    }
}
