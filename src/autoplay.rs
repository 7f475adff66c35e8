//! Headless autoplay: a greedy bot plays seeded games, and a stress check
//! deals forced full refills against fixed boards.
//!
//! Output types are serde-serializable so the binary can print them as JSON.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::config::Tuning;
use crate::core::occupancy::Occupancy;
use crate::core::oracle::shape_can_fit_anywhere;
use crate::core::rng::SimpleRng;
use crate::core::tracker::GameTracker;
use crate::core::types::{TrayKind, TRAY_SIZE};
use crate::engine::policy::BoardFeatures;
use crate::engine::{GenerateContext, GuaranteeStatus, Session, TrayDeal, TrayGenerator};

/// Autoplay settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoplayConfig {
    pub seed: u32,
    pub games: u32,
    /// Stop a game after this many trays even if it is still alive
    pub max_trays: u32,
    /// JSON [`Tuning`] file; defaults when unset
    pub tuning_path: Option<PathBuf>,
    /// Forced refills per stress board; 0 skips the stress check
    pub stress_iterations: u32,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            games: 1,
            max_trays: 500,
            tuning_path: None,
            stress_iterations: 0,
        }
    }
}

impl AutoplayConfig {
    /// Read `CLASSIC_BLOCKS_*` variables; missing or malformed numbers keep defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let number = |key: &str, default: u32| {
            env::var(key)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        let tuning_path = env::var("CLASSIC_BLOCKS_TUNING")
            .ok()
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(PathBuf::from(s)) });

        Self {
            seed: number("CLASSIC_BLOCKS_SEED", defaults.seed),
            games: number("CLASSIC_BLOCKS_GAMES", defaults.games),
            max_trays: number("CLASSIC_BLOCKS_MAX_TRAYS", defaults.max_trays),
            tuning_path,
            stress_iterations: number("CLASSIC_BLOCKS_STRESS", defaults.stress_iterations),
        }
    }

    /// Load the tuning file, or the defaults when none is configured
    pub fn load_tuning(&self) -> Result<Tuning> {
        let Some(path) = &self.tuning_path else {
            return Ok(Tuning::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading tuning file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing tuning file {}", path.display()))
    }
}

/// Deal counts by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealCounts {
    pub baseline: u32,
    pub good: u32,
    pub perfect_opening: u32,
    pub perfect_finish: u32,
    /// Baseline deals that fell back after the retry cap
    pub fit_only: u32,
    pub waived: u32,
}

impl DealCounts {
    pub fn record(&mut self, deal: &TrayDeal) {
        match deal.kind {
            TrayKind::Baseline => self.baseline += 1,
            TrayKind::Good(_) => self.good += 1,
            TrayKind::PerfectOpening => self.perfect_opening += 1,
            TrayKind::PerfectFinish => self.perfect_finish += 1,
        }
        match deal.guarantee {
            GuaranteeStatus::FitOnly => self.fit_only += 1,
            GuaranteeStatus::Waived => self.waived += 1,
            GuaranteeStatus::Satisfied | GuaranteeStatus::NotEnforced => {}
        }
    }
}

/// Result of one autoplay game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub seed: u32,
    pub score: u32,
    pub trays: u32,
    pub pieces: u32,
    pub lines_cleared: u32,
    pub board_clears: u32,
    pub best_combo: u32,
    pub deals: DealCounts,
    pub game_over: bool,
}

/// Best (slot, row, col) over every tray piece by the solver's anchor score.
/// The first slot and anchor win ties.
fn choose_move(session: &Session) -> Option<(usize, i8, i8)> {
    let features = BoardFeatures::of(session.grid().occupancy());
    let mut best: Option<(i32, usize, i8, i8)> = None;
    for (slot, piece) in session.tray().pieces() {
        let Some(shape) = session.library().get(piece.shape) else {
            continue;
        };
        if let Some(p) = features.best(shape) {
            if best.map_or(true, |(score, ..)| p.score > score) {
                best = Some((p.score, slot, p.placement.row as i8, p.placement.col as i8));
            }
        }
    }
    best.map(|(_, slot, row, col)| (slot, row, col))
}

/// Play one game with the greedy bot
pub fn play_game(seed: u32, tuning: &Tuning, max_trays: u32) -> GameSummary {
    let mut session = Session::with_tuning(seed, tuning.clone());
    let mut deals = DealCounts::default();
    let mut pieces = 0;
    let mut board_clears = 0;
    let mut best_combo = 0;

    while !session.game_over() && session.tracker().tray_count() <= max_trays {
        let Some((slot, row, col)) = choose_move(&session) else {
            break;
        };
        let outcome = match session.place_piece(slot, row, col) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(seed, code = err.code(), message = err.message(), "bot move rejected");
                break;
            }
        };
        pieces += 1;
        if outcome.board_cleared {
            board_clears += 1;
        }
        best_combo = best_combo.max(session.combo());
        if let Some(deal) = &outcome.refill {
            deals.record(deal);
        }
    }

    let tracker = session.tracker();
    debug!(seed, score = tracker.score(), trays = tracker.tray_count(), "autoplay game finished");
    GameSummary {
        seed,
        score: tracker.score(),
        trays: tracker.tray_count(),
        pieces,
        lines_cleared: tracker.lines_cleared(),
        board_clears,
        best_combo,
        deals,
        game_over: session.game_over(),
    }
}

/// Outcome of forced full refills against one board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressReport {
    pub board: String,
    pub iterations: u32,
    /// Trays with no fitting piece while some catalog shape fits
    pub guarantee_failures: u32,
    pub deals: DealCounts,
}

/// Boards the stress check runs against
pub const STRESS_BOARDS: [(&str, [&str; 8]); 3] = [
    (
        "open",
        [
            "........", "........", "........", "........",
            "........", "........", "##......", "###..#..",
        ],
    ),
    (
        "ragged",
        [
            "#.#.#.#.", ".#.#.#.#", "#.#.#.#.", ".#.#.#.#",
            "#.#.#.#.", ".#.#.#.#", "#.#.#.#.", ".#.#.#.#",
        ],
    ),
    (
        "crowded",
        [
            "###.####", "##.#####", "#.######", ".#######",
            "######.#", "#####.##", "####.###", "###.####",
        ],
    ),
];

/// Deal `iterations` full refills against `grid`, counting guarantee failures
pub fn stress_refills(
    tuning: &Tuning,
    name: &str,
    grid: Occupancy,
    iterations: u32,
    seed: u32,
) -> StressReport {
    let generator = TrayGenerator::new(tuning.clone());
    let library = generator.library();
    let catalog_fits = library.iter().any(|(_, s)| shape_can_fit_anywhere(grid, s));

    let mut tracker = GameTracker::new();
    let mut rng = SimpleRng::new(seed);
    let mut deals = DealCounts::default();
    let mut guarantee_failures = 0;

    for _ in 0..iterations {
        let deal = generator.generate(&mut GenerateContext {
            grid,
            slots_to_fill: TRAY_SIZE,
            tracker: &mut tracker,
            rng: &mut rng,
        });
        deals.record(&deal);
        let tray_fits = deal
            .shapes
            .iter()
            .any(|&id| library.get(id).is_some_and(|s| shape_can_fit_anywhere(grid, s)));
        if catalog_fits && !tray_fits {
            warn!(board = name, shapes = ?deal.shapes, "dealt tray has no fitting piece");
            guarantee_failures += 1;
        }
    }

    StressReport {
        board: name.to_string(),
        iterations,
        guarantee_failures,
        deals,
    }
}
