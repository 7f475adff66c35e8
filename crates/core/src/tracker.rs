//! Game state tracker - session counters that drive tray odds and scoring
//!
//! The tracker owns the score, the combo streak, tray and line counters,
//! and the 3+3 perfect-sequence state machine. The generator reads it to
//! roll special-tray odds; the session feeds it placement and tray events.

use arrayvec::ArrayVec;

use crate::config::{ComboPolicy, GoodTrayOdds, PerfectTrayOdds, PhaseTuning, ScoringRules};
use crate::occupancy::Occupancy;
use crate::scoring::{calculate_score, ScoreResult};
use crate::types::{GamePhase, ShapeId, TRAY_SIZE};

/// A pre-solved 3+3 board clear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfectPlan {
    /// First tray, dealt when the sequence starts
    pub opening: [ShapeId; TRAY_SIZE],
    /// Board expected once the opening is placed as planned
    pub board_after_opening: Occupancy,
    /// Pieces that finish the clear from `board_after_opening`; may be empty
    /// when the opening alone empties the board
    pub finish: ArrayVec<ShapeId, TRAY_SIZE>,
}

/// Progress through a 3+3 board clear
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PerfectSequence {
    #[default]
    Idle,
    /// A plan was found; its opening tray is being verified and dealt
    Phase1(PerfectPlan),
    /// The opening was dealt; the next full refill deals the finish
    Phase2(PerfectPlan),
}

impl PerfectSequence {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerfectSequence::Idle => "idle",
            PerfectSequence::Phase1(_) => "phase1",
            PerfectSequence::Phase2(_) => "phase2",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, PerfectSequence::Idle)
    }

    /// Waiting to deal the second half of a sequence
    pub fn awaiting_finish(&self) -> bool {
        matches!(self, PerfectSequence::Phase2(_))
    }
}

/// Derive the game phase from tray count and board fill
pub fn game_phase(tuning: &PhaseTuning, tray_count: u32, fill_ratio: f64) -> GamePhase {
    if tray_count <= tuning.early_trays
        || (tray_count <= tuning.early_open_trays && fill_ratio < tuning.early_open_fill)
    {
        return GamePhase::Early;
    }
    if tray_count > tuning.late_trays
        || (tray_count > tuning.late_crowded_trays && fill_ratio > tuning.late_crowded_fill)
    {
        return GamePhase::Late;
    }
    GamePhase::Mid
}

/// Session counters
#[derive(Debug, Clone, Default)]
pub struct GameTracker {
    tray_count: u32,
    lines_cleared: u32,
    last_clear_count: u32,
    /// Survives [`GameTracker::reset`]
    total_lines_cleared_ever: u32,
    perfect_tray_used: bool,
    perfect_tray_count: u32,
    perfect_sequence: PerfectSequence,
    score: u32,
    combo: u32,
    current_tray_had_clear: bool,
    pieces_placed_this_tray: u32,
}

impl GameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tray_count(&self) -> u32 {
        self.tray_count
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn last_clear_count(&self) -> u32 {
        self.last_clear_count
    }

    pub fn total_lines_cleared_ever(&self) -> u32 {
        self.total_lines_cleared_ever
    }

    pub fn perfect_tray_used(&self) -> bool {
        self.perfect_tray_used
    }

    pub fn perfect_tray_count(&self) -> u32 {
        self.perfect_tray_count
    }

    pub fn perfect_sequence(&self) -> &PerfectSequence {
        &self.perfect_sequence
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn current_tray_had_clear(&self) -> bool {
        self.current_tray_had_clear
    }

    pub fn pieces_placed_this_tray(&self) -> u32 {
        self.pieces_placed_this_tray
    }

    pub fn phase(&self, tuning: &PhaseTuning, fill_ratio: f64) -> GamePhase {
        game_phase(tuning, self.tray_count, fill_ratio)
    }

    /// Chance of attempting a good tray on this refill
    pub fn good_tray_odds(&self, odds: &GoodTrayOdds, phase: GamePhase, fill_ratio: f64) -> f64 {
        let mut p = match phase {
            GamePhase::Early => odds.early.at(fill_ratio),
            GamePhase::Mid => odds.mid.boosted(fill_ratio).unwrap_or(
                if self.last_clear_count >= odds.mid_multi_clear_lines {
                    odds.mid_multi_clear
                } else {
                    odds.mid.base
                },
            ),
            GamePhase::Late => odds.late.at(fill_ratio),
        };
        if fill_ratio < odds.very_open_fill {
            p = p.max(odds.very_open_floor);
        }
        p.min(odds.cap)
    }

    /// Chance of starting a perfect sequence on this refill
    pub fn perfect_tray_odds(
        &self,
        odds: &PerfectTrayOdds,
        phase: GamePhase,
        fill_ratio: f64,
    ) -> f64 {
        if self.tray_count < odds.min_trays {
            return 0.0;
        }
        let mut p = match phase {
            GamePhase::Early => odds.early.at(fill_ratio),
            GamePhase::Mid => odds.mid.at(fill_ratio),
            GamePhase::Late => odds.late.at(fill_ratio),
        };
        if self.total_lines_cleared_ever >= odds.milestone_lines {
            p += (p * odds.milestone_factor).min(odds.milestone_max_boost);
        }
        if self.perfect_tray_used {
            p *= odds.used_factor;
        }
        if self.perfect_tray_count > 0 {
            p *= odds.repeat_decay.powi(self.perfect_tray_count as i32);
        }
        p.max(odds.floor)
    }

    /// A full tray was dealt
    pub fn on_tray_dealt(&mut self) {
        self.tray_count += 1;
        self.current_tray_had_clear = false;
        self.pieces_placed_this_tray = 0;
    }

    /// A piece of `cells` cells was placed and cleared `lines` lines.
    ///
    /// Scores the placement with the streak from before this clear, then
    /// advances the counters.
    pub fn on_piece_placed(
        &mut self,
        rules: &ScoringRules,
        cells: u32,
        lines: u32,
        board_empty: bool,
    ) -> ScoreResult {
        let result = calculate_score(rules, cells, lines, self.combo, board_empty);
        self.score = self.score.saturating_add(result.total);
        self.pieces_placed_this_tray += 1;

        if lines > 0 {
            self.lines_cleared += lines;
            self.last_clear_count = lines;
            self.total_lines_cleared_ever += lines;
            self.current_tray_had_clear = true;
            if rules.combo == ComboPolicy::PerLine {
                self.combo = self.combo.saturating_add(lines);
            }
        }
        result
    }

    /// Every piece of the current tray was placed
    pub fn on_tray_complete(&mut self, rules: &ScoringRules) {
        match (rules.combo, self.current_tray_had_clear) {
            (_, false) => self.combo = 0,
            (ComboPolicy::PerTray, true) => self.combo = self.combo.saturating_add(1),
            (ComboPolicy::PerLine, true) => {}
        }
    }

    pub fn set_perfect_sequence(&mut self, sequence: PerfectSequence) {
        self.perfect_sequence = sequence;
    }

    /// Take the sequence, leaving `Idle` behind
    pub fn take_perfect_sequence(&mut self) -> PerfectSequence {
        std::mem::take(&mut self.perfect_sequence)
    }

    /// A verified perfect opening was dealt
    pub fn record_perfect_started(&mut self) {
        self.perfect_tray_used = true;
        self.perfect_tray_count += 1;
    }

    /// Start a new game, keeping the lifetime line count
    pub fn reset(&mut self) {
        *self = Self {
            total_lines_cleared_ever: self.total_lines_cleared_ever,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;

    #[test]
    fn phase_thresholds() {
        let t = PhaseTuning::default();
        assert_eq!(game_phase(&t, 15, 0.9), GamePhase::Early);
        assert_eq!(game_phase(&t, 20, 0.2), GamePhase::Early);
        assert_eq!(game_phase(&t, 20, 0.5), GamePhase::Mid);
        assert_eq!(game_phase(&t, 40, 0.8), GamePhase::Late);
        assert_eq!(game_phase(&t, 40, 0.5), GamePhase::Mid);
        assert_eq!(game_phase(&t, 51, 0.1), GamePhase::Late);
    }

    #[test]
    fn good_odds_floor_and_cap() {
        let tuning = Tuning::default();
        let tracker = GameTracker::new();
        let p = tracker.good_tray_odds(&tuning.good, GamePhase::Late, 0.1);
        assert_eq!(p, 0.54);
        let p = tracker.good_tray_odds(&tuning.good, GamePhase::Early, 0.1);
        assert_eq!(p, 0.65);
        let p = tracker.good_tray_odds(&tuning.good, GamePhase::Mid, 0.6);
        assert_eq!(p, 0.32);
    }

    #[test]
    fn mid_game_multi_clear_boost() {
        let tuning = Tuning::default();
        let mut tracker = GameTracker::new();
        tracker.on_piece_placed(&tuning.scoring, 3, 3, false);
        assert_eq!(tracker.good_tray_odds(&tuning.good, GamePhase::Mid, 0.6), 0.40);
        // Open boards take precedence.
        assert_eq!(tracker.good_tray_odds(&tuning.good, GamePhase::Mid, 0.3), 0.50);
    }

    #[test]
    fn perfect_odds_gate_and_decay() {
        let odds = PerfectTrayOdds::default();
        let mut tracker = GameTracker::new();
        assert_eq!(tracker.perfect_tray_odds(&odds, GamePhase::Early, 0.1), 0.0);

        for _ in 0..5 {
            tracker.on_tray_dealt();
        }
        let fresh = tracker.perfect_tray_odds(&odds, GamePhase::Mid, 0.6);
        assert!((fresh - 0.25).abs() < 1e-9);

        tracker.record_perfect_started();
        let used = tracker.perfect_tray_odds(&odds, GamePhase::Mid, 0.6);
        assert!((used - 0.25 * 0.3 * 0.7).abs() < 1e-9);

        for _ in 0..20 {
            tracker.record_perfect_started();
        }
        assert_eq!(tracker.perfect_tray_odds(&odds, GamePhase::Late, 0.9), 0.02);
    }

    #[test]
    fn milestone_boost_is_capped() {
        let tuning = Tuning::default();
        let mut tracker = GameTracker::new();
        for _ in 0..5 {
            tracker.on_tray_dealt();
        }
        tracker.on_piece_placed(&tuning.scoring, 1, 20, false);
        // 0.62 + min(0.5, 0.93)
        let p = tracker.perfect_tray_odds(&tuning.perfect, GamePhase::Early, 0.1);
        assert!((p - 1.12).abs() < 1e-9);
    }

    #[test]
    fn per_line_combo_grows_by_lines_and_resets_on_dry_tray() {
        let rules = ScoringRules::default();
        let mut tracker = GameTracker::new();
        tracker.on_tray_dealt();
        let first = tracker.on_piece_placed(&rules, 4, 2, false);
        assert_eq!(first.line_clear, 90);
        assert_eq!(tracker.combo(), 2);
        let second = tracker.on_piece_placed(&rules, 2, 1, false);
        assert_eq!(second.line_clear, 135);
        tracker.on_tray_complete(&rules);
        assert_eq!(tracker.combo(), 3);

        tracker.on_tray_dealt();
        tracker.on_piece_placed(&rules, 1, 0, false);
        tracker.on_tray_complete(&rules);
        assert_eq!(tracker.combo(), 0);
    }

    #[test]
    fn per_tray_combo_counts_trays() {
        let rules = ScoringRules {
            combo: ComboPolicy::PerTray,
            ..ScoringRules::default()
        };
        let mut tracker = GameTracker::new();
        tracker.on_tray_dealt();
        tracker.on_piece_placed(&rules, 1, 3, false);
        assert_eq!(tracker.combo(), 0);
        tracker.on_tray_complete(&rules);
        assert_eq!(tracker.combo(), 1);
    }

    #[test]
    fn reset_keeps_lifetime_lines() {
        let rules = ScoringRules::default();
        let mut tracker = GameTracker::new();
        tracker.on_tray_dealt();
        tracker.on_piece_placed(&rules, 5, 2, true);
        tracker.record_perfect_started();
        tracker.reset();
        assert_eq!(tracker.total_lines_cleared_ever(), 2);
        assert_eq!(tracker.score(), 0);
        assert_eq!(tracker.tray_count(), 0);
        assert!(!tracker.perfect_tray_used());
        assert!(tracker.perfect_sequence().is_idle());
    }
}
