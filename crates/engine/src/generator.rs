//! Tray generator - picks the next three shapes for a session
//!
//! A full refill walks this ladder:
//!
//! 1. A pending 3+3 sequence deals its finishing tray
//! 2. Otherwise roll for a new 3+3 sequence (plus a small luck roll)
//! 3. Otherwise roll for a good tray
//! 4. Otherwise deal a weighted-random baseline tray that fits the board
//!    and, within the retry cap, can clear a line
//!
//! Special trays from steps 1-3 are re-verified with the exhaustive clear
//! check; one that fails falls through to the next step. Partial refills
//! skip the ladder and sample each empty slot independently.

use arrayvec::ArrayVec;
use tracing::{debug, info, warn};

use classic_blocks_core::config::Tuning;
use classic_blocks_core::occupancy::Occupancy;
use classic_blocks_core::oracle::shape_can_fit_anywhere;
use classic_blocks_core::rng::SimpleRng;
use classic_blocks_core::shapes::{Shape, ShapeLibrary};
use classic_blocks_core::tracker::{GameTracker, PerfectPlan, PerfectSequence};
use classic_blocks_core::types::{GamePhase, ShapeId, TrayKind, TRAY_SIZE};

use crate::good::{GoodTray, GoodTraySearch};
use crate::perfect;
use crate::policy::Policy;
use crate::solver::can_clear_within;

/// How far a deal honors the solvability guarantee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuaranteeStatus {
    /// Some piece fits and the tray can clear a line
    Satisfied,
    /// Some piece fits; no clearing tray was found within the retry cap
    FitOnly,
    /// Nothing in the catalog fits the board
    Waived,
    /// Partial refill
    NotEnforced,
}

impl GuaranteeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GuaranteeStatus::Satisfied => "satisfied",
            GuaranteeStatus::FitOnly => "fit_only",
            GuaranteeStatus::Waived => "waived",
            GuaranteeStatus::NotEnforced => "not_enforced",
        }
    }
}

/// Result of one refill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayDeal {
    /// One shape per slot being filled, in slot order
    pub shapes: ArrayVec<ShapeId, TRAY_SIZE>,
    pub kind: TrayKind,
    pub guarantee: GuaranteeStatus,
}

impl TrayDeal {
    fn new(
        shapes: impl IntoIterator<Item = ShapeId>,
        kind: TrayKind,
        guarantee: GuaranteeStatus,
    ) -> Self {
        Self {
            shapes: shapes.into_iter().collect(),
            kind,
            guarantee,
        }
    }
}

/// Everything one refill reads and advances
pub struct GenerateContext<'a> {
    pub grid: Occupancy,
    /// Empty tray slots; the full ladder runs only when this is `TRAY_SIZE`
    pub slots_to_fill: usize,
    pub tracker: &'a mut GameTracker,
    pub rng: &'a mut SimpleRng,
}

/// Deals trays from a shape catalog under a tuning
#[derive(Debug, Clone)]
pub struct TrayGenerator {
    library: ShapeLibrary,
    tuning: Tuning,
    policy: Policy,
}

impl TrayGenerator {
    /// Generator over the classic catalog
    pub fn new(tuning: Tuning) -> Self {
        Self::with_library(ShapeLibrary::classic(), tuning)
    }

    pub fn with_library(library: ShapeLibrary, tuning: Tuning) -> Self {
        let policy = Policy::from_choice(tuning.policy);
        Self {
            library,
            tuning,
            policy,
        }
    }

    /// Replace the placement policy the solver uses
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn library(&self) -> &ShapeLibrary {
        &self.library
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Deal shapes for the empty slots of a tray.
    ///
    /// A full refill advances the tray count and may advance the 3+3
    /// sequence; a partial refill touches neither.
    pub fn generate(&self, ctx: &mut GenerateContext<'_>) -> TrayDeal {
        if ctx.slots_to_fill < TRAY_SIZE {
            let shapes = (0..ctx.slots_to_fill)
                .filter_map(|_| self.weighted_shape(ctx.rng))
                .collect::<ArrayVec<_, TRAY_SIZE>>();
            debug!(slots = ctx.slots_to_fill, "partial refill");
            return TrayDeal::new(shapes, TrayKind::Baseline, GuaranteeStatus::NotEnforced);
        }

        let deal = self
            .special_tray(ctx)
            .unwrap_or_else(|| self.baseline(ctx.grid, ctx.rng));
        ctx.tracker.on_tray_dealt();
        debug!(
            tray = ctx.tracker.tray_count(),
            kind = deal.kind.as_str(),
            guarantee = deal.guarantee.as_str(),
            "tray dealt"
        );
        deal
    }

    fn special_tray(&self, ctx: &mut GenerateContext<'_>) -> Option<TrayDeal> {
        let fill_ratio = ctx.grid.fill_ratio();
        let phase = ctx.tracker.phase(&self.tuning.phases, fill_ratio);

        match ctx.tracker.take_perfect_sequence() {
            PerfectSequence::Phase2(plan) => self.finish_sequence(ctx.grid, &plan),
            PerfectSequence::Phase1(_) | PerfectSequence::Idle => self
                .roll_perfect(ctx, phase, fill_ratio)
                .or_else(|| self.roll_good(ctx, phase, fill_ratio)),
        }
    }

    fn finish_sequence(&self, grid: Occupancy, plan: &PerfectPlan) -> Option<TrayDeal> {
        let Some(shapes) = self.perfect_finish(grid, plan) else {
            debug!(fill_ratio = grid.fill_ratio(), "no perfect finish for this board");
            return None;
        };
        if !self.verify_special(grid, &shapes) {
            warn!(
                kind = TrayKind::PerfectFinish.as_str(),
                ?shapes,
                "special tray failed verification"
            );
            return None;
        }
        info!(?shapes, "perfect finish dealt");
        Some(TrayDeal::new(shapes, TrayKind::PerfectFinish, GuaranteeStatus::Satisfied))
    }

    fn roll_perfect(
        &self,
        ctx: &mut GenerateContext<'_>,
        phase: GamePhase,
        fill_ratio: f64,
    ) -> Option<TrayDeal> {
        let odds = &self.tuning.perfect;
        let p = ctx.tracker.perfect_tray_odds(odds, phase, fill_ratio);
        let hit = ctx.rng.next_f64() < p
            || (ctx.tracker.tray_count() >= odds.min_trays
                && ctx.rng.next_f64() < odds.luck_chance);
        debug!(tray = ctx.tracker.tray_count(), ?phase, fill_ratio, odds = p, hit, "perfect roll");
        if !hit {
            return None;
        }

        let plan = self.check_board_solvable_in_six(ctx.grid)?;
        let opening = plan.opening;
        ctx.tracker.set_perfect_sequence(PerfectSequence::Phase1(plan.clone()));

        if !self.verify_special(ctx.grid, &opening) {
            warn!(
                kind = TrayKind::PerfectOpening.as_str(),
                shapes = ?opening,
                "special tray failed verification"
            );
            ctx.tracker.set_perfect_sequence(PerfectSequence::Idle);
            return None;
        }

        ctx.tracker.set_perfect_sequence(PerfectSequence::Phase2(plan));
        ctx.tracker.record_perfect_started();
        info!(
            tray = ctx.tracker.tray_count(),
            perfect_trays = ctx.tracker.perfect_tray_count(),
            shapes = ?opening,
            "perfect opening dealt"
        );
        Some(TrayDeal::new(opening, TrayKind::PerfectOpening, GuaranteeStatus::Satisfied))
    }

    fn roll_good(
        &self,
        ctx: &mut GenerateContext<'_>,
        phase: GamePhase,
        fill_ratio: f64,
    ) -> Option<TrayDeal> {
        let p = ctx.tracker.good_tray_odds(&self.tuning.good, phase, fill_ratio);
        let hit = ctx.rng.next_f64() < p;
        debug!(?phase, fill_ratio, odds = p, hit, "good tray roll");
        if !hit {
            return None;
        }

        let tray = self.find_good_tray(ctx.grid, ctx.rng)?;
        if !self.verify_special(ctx.grid, &tray.shapes) {
            warn!(
                kind = tray.search.as_str(),
                shapes = ?tray.shapes,
                "special tray failed verification"
            );
            return None;
        }
        info!(
            search = tray.search.as_str(),
            tier = tray.search.tier(),
            cleared_lines = tray.outcome.cleared_lines,
            "good tray dealt"
        );
        Some(TrayDeal::new(tray.shapes, TrayKind::Good(tray.search), GuaranteeStatus::Satisfied))
    }

    /// Run the good-tray searches in tier order
    pub fn find_good_tray(&self, grid: Occupancy, rng: &mut SimpleRng) -> Option<GoodTray> {
        GoodTraySearch::new(&self.library, grid, &self.tuning.limits, &self.policy).find(rng)
    }

    /// Plan a 3+3 board clear from `grid`
    pub fn check_board_solvable_in_six(&self, grid: Occupancy) -> Option<PerfectPlan> {
        perfect::check_board_solvable_in_six(&self.library, grid, &self.tuning.limits)
    }

    /// Shapes that empty `grid` by exact cavity fills, at most `max_pieces`
    pub fn clear_board_with_n_pieces(
        &self,
        grid: Occupancy,
        max_pieces: usize,
    ) -> Option<Vec<ShapeId>> {
        perfect::clear_board_with_n_pieces(&self.library, grid, max_pieces)
    }

    /// Finishing tray for a started sequence
    pub fn perfect_finish(
        &self,
        grid: Occupancy,
        plan: &PerfectPlan,
    ) -> Option<[ShapeId; TRAY_SIZE]> {
        perfect::perfect_finish(&self.library, grid, plan, &self.tuning.limits)
    }

    /// Weighted-random full tray with the fit guarantee and, within the
    /// retry cap, the clear guarantee
    pub fn baseline(&self, grid: Occupancy, rng: &mut SimpleRng) -> TrayDeal {
        let playable: Vec<ShapeId> = self
            .library
            .iter()
            .filter(|(_, s)| shape_can_fit_anywhere(grid, s))
            .map(|(id, _)| id)
            .collect();

        if playable.is_empty() {
            let shapes = (0..TRAY_SIZE)
                .filter_map(|_| self.weighted_shape(rng))
                .collect::<ArrayVec<_, TRAY_SIZE>>();
            debug!(filled = grid.count_filled(), "dead board, guarantee waived");
            return TrayDeal::new(shapes, TrayKind::Baseline, GuaranteeStatus::Waived);
        }

        let attempts = self.tuning.limits.baseline_attempts;
        let mut last = None;
        for attempt in 0..attempts {
            let Some(shapes) = self.fitting_triple(grid, rng, &playable) else {
                break;
            };
            if self.clears(grid, &shapes) {
                debug!(attempt, "baseline tray satisfies the clear guarantee");
                return TrayDeal::new(shapes, TrayKind::Baseline, GuaranteeStatus::Satisfied);
            }
            last = Some(shapes);
        }

        let shapes = last
            .or_else(|| self.fitting_triple(grid, rng, &playable))
            .map(ArrayVec::from)
            .unwrap_or_default();
        warn!(attempts, fill_ratio = grid.fill_ratio(), "no clearing tray within the retry cap");
        TrayDeal::new(shapes, TrayKind::Baseline, GuaranteeStatus::FitOnly)
    }

    /// Weighted triple where at least one shape fits; slot 0 is swapped for
    /// a playable shape when none did
    fn fitting_triple(
        &self,
        grid: Occupancy,
        rng: &mut SimpleRng,
        playable: &[ShapeId],
    ) -> Option<[ShapeId; TRAY_SIZE]> {
        let mut shapes = [
            self.weighted_shape(rng)?,
            self.weighted_shape(rng)?,
            self.weighted_shape(rng)?,
        ];
        let fits = shapes
            .iter()
            .any(|&id| self.shape(id).is_some_and(|s| shape_can_fit_anywhere(grid, s)));
        if !fits {
            shapes[0] = *rng.choose(playable)?;
        }
        Some(shapes)
    }

    fn weighted_shape(&self, rng: &mut SimpleRng) -> Option<ShapeId> {
        self.library.weighted_random_shape(rng, self.tuning.tier_weights)
    }

    fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.library.get(id)
    }

    fn clears(&self, grid: Occupancy, ids: &[ShapeId]) -> bool {
        let shapes: Option<Vec<&Shape>> = ids.iter().map(|&id| self.shape(id)).collect();
        shapes.is_some_and(|s| can_clear_within(grid, &s, self.tuning.limits.clear_search_depth))
    }

    /// Every shape fits somewhere and the tray can clear a line
    pub fn verify_special(&self, grid: Occupancy, ids: &[ShapeId]) -> bool {
        let all_fit = ids
            .iter()
            .all(|&id| self.shape(id).is_some_and(|s| shape_can_fit_anywhere(grid, s)));
        all_fit && self.clears(grid, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        grid: Occupancy,
        slots: usize,
        tracker: &'a mut GameTracker,
        rng: &'a mut SimpleRng,
    ) -> GenerateContext<'a> {
        GenerateContext {
            grid,
            slots_to_fill: slots,
            tracker,
            rng,
        }
    }

    #[test]
    fn partial_refill_is_not_enforced() {
        let generator = TrayGenerator::new(Tuning::default());
        let mut tracker = GameTracker::new();
        let mut rng = SimpleRng::new(5);
        let deal = generator.generate(&mut ctx(Occupancy::EMPTY, 2, &mut tracker, &mut rng));
        assert_eq!(deal.shapes.len(), 2);
        assert_eq!(deal.guarantee, GuaranteeStatus::NotEnforced);
        assert_eq!(tracker.tray_count(), 0);
    }

    #[test]
    fn full_refill_counts_the_tray() {
        let generator = TrayGenerator::new(Tuning::default());
        let mut tracker = GameTracker::new();
        let mut rng = SimpleRng::new(5);
        let deal =
            generator.generate(&mut ctx(Occupancy::EMPTY, TRAY_SIZE, &mut tracker, &mut rng));
        assert_eq!(deal.shapes.len(), TRAY_SIZE);
        assert_eq!(tracker.tray_count(), 1);
    }

    #[test]
    fn dead_board_waives_the_guarantee() {
        let generator = TrayGenerator::new(Tuning::default());
        let mut rng = SimpleRng::new(9);
        let deal = generator.baseline(Occupancy::FULL, &mut rng);
        assert_eq!(deal.guarantee, GuaranteeStatus::Waived);
        assert_eq!(deal.shapes.len(), TRAY_SIZE);
    }

    #[test]
    fn one_free_cell_forces_the_single() {
        let generator = TrayGenerator::new(Tuning::default());
        let grid = Occupancy::FULL.without(1);
        let mut rng = SimpleRng::new(1);
        let deal = generator.baseline(grid, &mut rng);
        assert!(deal.shapes.contains(&ShapeId(0)));
        // Filling the last cell completes its row and column.
        assert_eq!(deal.guarantee, GuaranteeStatus::Satisfied);
    }

    #[test]
    fn zero_attempts_still_deals_a_fitting_tray() {
        let mut tuning = Tuning::default();
        tuning.limits.baseline_attempts = 0;
        let generator = TrayGenerator::new(tuning);
        let mut rng = SimpleRng::new(2);
        let deal = generator.baseline(Occupancy::EMPTY, &mut rng);
        assert_eq!(deal.guarantee, GuaranteeStatus::FitOnly);
        assert_eq!(deal.shapes.len(), TRAY_SIZE);
    }

    #[test]
    fn pending_sequence_is_consumed_by_the_next_refill() {
        let generator = TrayGenerator::new(Tuning::default());
        let mut tracker = GameTracker::new();
        let grid = Occupancy::from_ascii(&[
            "........", "........", "........", "........",
            "........", "........", "########", ".#######",
        ]);
        tracker.set_perfect_sequence(PerfectSequence::Phase2(PerfectPlan {
            opening: [ShapeId(0), ShapeId(2), ShapeId(4)],
            board_after_opening: grid,
            finish: [ShapeId(0)].into_iter().collect(),
        }));
        let mut rng = SimpleRng::new(3);
        let deal = generator.generate(&mut ctx(grid, TRAY_SIZE, &mut tracker, &mut rng));
        assert_eq!(deal.kind, TrayKind::PerfectFinish);
        assert_eq!(deal.shapes[0], ShapeId(0));
        assert!(tracker.perfect_sequence().is_idle());
    }
}
