//! Runtime tuning for tray odds, search caps, and scoring rules
//!
//! [`Tuning::default`] reproduces the built-in constants. Every section is
//! `#[serde(default)]`, so a JSON file only needs the fields it overrides:
//!
//! ```
//! use classic_blocks_core::config::{LineClearFormula, Tuning};
//!
//! let tuning: Tuning = serde_json::from_str(
//!     r#"{ "scoring": { "formula": "exponential" }, "good": { "cap": 0.5 } }"#,
//! ).unwrap();
//! assert_eq!(tuning.scoring.formula, LineClearFormula::Exponential);
//! assert_eq!(tuning.good.cap, 0.5);
//! assert_eq!(tuning.perfect.min_trays, 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{
    BASELINE_ATTEMPTS, GAP_COMBO_ATTEMPTS, GOOD_SAMPLE_ATTEMPTS, MAX_CLEAR_SEARCH_DEPTH,
    MULTI_CLEAR_PROBE_ATTEMPTS, PERFECT_CAVITY_WINDOW, PERFECT_FINISH_DEPTH,
    PERFECT_PAIR_ATTEMPTS, SIMPLE_COMBO_ATTEMPTS, TIER_WEIGHTS, TOP_LINE_GAPS,
};

/// Thresholds that map (tray count, fill ratio) to a game phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTuning {
    /// Early while the tray count is at most this
    pub early_trays: u32,
    /// ...or at most this with a board emptier than `early_open_fill`
    pub early_open_trays: u32,
    pub early_open_fill: f64,
    /// Late once the tray count exceeds this
    pub late_trays: u32,
    /// ...or exceeds this with a board fuller than `late_crowded_fill`
    pub late_crowded_trays: u32,
    pub late_crowded_fill: f64,
}

impl Default for PhaseTuning {
    fn default() -> Self {
        Self {
            early_trays: 15,
            early_open_trays: 25,
            early_open_fill: 0.3,
            late_trays: 50,
            late_crowded_trays: 35,
            late_crowded_fill: 0.7,
        }
    }
}

/// Odds for one phase, raised on emptier boards.
///
/// Below `open_below` fill the odds are `open`; otherwise below
/// `moderate_below` they are `moderate`; otherwise `base`. A threshold of 0
/// never applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseOdds {
    pub base: f64,
    pub open_below: f64,
    pub open: f64,
    pub moderate_below: f64,
    pub moderate: f64,
}

impl PhaseOdds {
    pub const fn new(
        base: f64,
        open_below: f64,
        open: f64,
        moderate_below: f64,
        moderate: f64,
    ) -> Self {
        Self {
            base,
            open_below,
            open,
            moderate_below,
            moderate,
        }
    }

    /// Odds at `fill_ratio`, or `None` when only the base applies
    pub fn boosted(&self, fill_ratio: f64) -> Option<f64> {
        if fill_ratio < self.open_below {
            Some(self.open)
        } else if fill_ratio < self.moderate_below {
            Some(self.moderate)
        } else {
            None
        }
    }

    pub fn at(&self, fill_ratio: f64) -> f64 {
        self.boosted(fill_ratio).unwrap_or(self.base)
    }
}

impl Default for PhaseOdds {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, 0.0)
    }
}

/// Chance of attempting a good tray on a full refill
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoodTrayOdds {
    pub early: PhaseOdds,
    pub mid: PhaseOdds,
    pub late: PhaseOdds,
    /// Mid-game odds after the last placement cleared this many lines
    pub mid_multi_clear_lines: u32,
    pub mid_multi_clear: f64,
    /// Boards emptier than this get at least `very_open_floor`
    pub very_open_fill: f64,
    pub very_open_floor: f64,
    pub cap: f64,
}

impl Default for GoodTrayOdds {
    fn default() -> Self {
        Self {
            early: PhaseOdds::new(0.50, 0.3, 0.65, 0.5, 0.58),
            mid: PhaseOdds::new(0.32, 0.4, 0.50, 0.0, 0.32),
            late: PhaseOdds::new(0.15, 0.3, 0.22, 0.0, 0.15),
            mid_multi_clear_lines: 3,
            mid_multi_clear: 0.40,
            very_open_fill: 0.25,
            very_open_floor: 0.54,
            cap: 0.70,
        }
    }
}

/// Chance of starting a 3+3 board clear on a full refill
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfectTrayOdds {
    /// No perfect trays before this many trays were dealt
    pub min_trays: u32,
    pub early: PhaseOdds,
    pub mid: PhaseOdds,
    pub late: PhaseOdds,
    /// Lifetime lines cleared that unlock the milestone boost
    pub milestone_lines: u32,
    pub milestone_factor: f64,
    pub milestone_max_boost: f64,
    /// Multiplier once any perfect tray was dealt this game
    pub used_factor: f64,
    /// Further multiplier per perfect tray dealt
    pub repeat_decay: f64,
    pub floor: f64,
    /// Independent second roll when the main roll fails
    pub luck_chance: f64,
}

impl Default for PerfectTrayOdds {
    fn default() -> Self {
        Self {
            min_trays: 5,
            early: PhaseOdds::new(0.45, 0.3, 0.62, 0.5, 0.54),
            mid: PhaseOdds::new(0.25, 0.4, 0.40, 0.0, 0.25),
            late: PhaseOdds::new(0.10, 0.3, 0.18, 0.0, 0.10),
            milestone_lines: 20,
            milestone_factor: 1.5,
            milestone_max_boost: 0.5,
            used_factor: 0.3,
            repeat_decay: 0.7,
            floor: 0.02,
            luck_chance: 0.002,
        }
    }
}

/// Iteration caps for every bounded search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    pub baseline_attempts: u32,
    pub good_sample_attempts: u32,
    pub multi_clear_probe_attempts: u32,
    pub gap_combo_attempts: u32,
    pub simple_combo_attempts: u32,
    pub top_line_gaps: usize,
    pub perfect_pair_attempts: u32,
    pub perfect_cavity_window: usize,
    pub perfect_finish_depth: usize,
    pub clear_search_depth: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            baseline_attempts: BASELINE_ATTEMPTS,
            good_sample_attempts: GOOD_SAMPLE_ATTEMPTS,
            multi_clear_probe_attempts: MULTI_CLEAR_PROBE_ATTEMPTS,
            gap_combo_attempts: GAP_COMBO_ATTEMPTS,
            simple_combo_attempts: SIMPLE_COMBO_ATTEMPTS,
            top_line_gaps: TOP_LINE_GAPS,
            perfect_pair_attempts: PERFECT_PAIR_ATTEMPTS,
            perfect_cavity_window: PERFECT_CAVITY_WINDOW,
            perfect_finish_depth: PERFECT_FINISH_DEPTH,
            clear_search_depth: MAX_CLEAR_SEARCH_DEPTH,
        }
    }
}

/// Points per cleared line as a function of lines and combo streak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineClearFormula {
    /// Per-line points step up with the streak: 45, 90, 135, 180, 280, +70 each
    #[default]
    Stepped,
    /// `24 * 4^(lines - 1) * (streak + 1)`
    Exponential,
}

/// How the combo streak advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboPolicy {
    /// Grows by the lines of every clear; reset when a tray ends without one
    #[default]
    PerLine,
    /// Grows by one when a tray ends with a clear; reset otherwise
    PerTray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub formula: LineClearFormula,
    pub combo: ComboPolicy,
    /// Full-board clear bonus as a multiple of the line points just earned
    pub full_clear_multiplier: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            formula: LineClearFormula::Stepped,
            combo: ComboPolicy::PerLine,
            full_clear_multiplier: 5,
        }
    }
}

/// Placement policy the tray solver uses at each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PolicyChoice {
    #[default]
    Greedy,
    Lookahead { breadth: usize },
}

/// Every runtime knob of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub phases: PhaseTuning,
    pub good: GoodTrayOdds,
    pub perfect: PerfectTrayOdds,
    pub limits: SearchLimits,
    /// `[easy, medium, hard]`
    pub tier_weights: [u32; 3],
    pub scoring: ScoringRules,
    pub policy: PolicyChoice,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            phases: PhaseTuning::default(),
            good: GoodTrayOdds::default(),
            perfect: PerfectTrayOdds::default(),
            limits: SearchLimits::default(),
            tier_weights: TIER_WEIGHTS,
            scoring: ScoringRules::default(),
            policy: PolicyChoice::Greedy,
        }
    }
}
