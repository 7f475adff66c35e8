//! One game: board, tray, counters, and the generator that refills the tray
//!
//! A session is driven by two inbound calls: [`Session::place_piece`] when
//! the player drops a piece, and [`Session::request_tray_refill`], which the
//! session also calls itself once the tray runs empty. Both leave the
//! game-over flag current.

use arrayvec::ArrayVec;
use tracing::{debug, info};

use classic_blocks_core::config::Tuning;
use classic_blocks_core::grid::Grid;
use classic_blocks_core::rng::{ColorBag, SimpleRng};
use classic_blocks_core::shapes::{Shape, ShapeLibrary};
use classic_blocks_core::snapshot::SessionSnapshot;
use classic_blocks_core::tracker::GameTracker;
use classic_blocks_core::tray::{Tray, TrayPiece};
use classic_blocks_core::types::{GamePhase, TRAY_SIZE};

use crate::generator::{GenerateContext, TrayDeal, TrayGenerator};
use crate::place::{validate_place, PlaceError, PlaceOutcome};
use crate::solver;

#[derive(Debug, Clone)]
pub struct Session {
    seed: u32,
    grid: Grid,
    tray: Tray,
    tracker: GameTracker,
    generator: TrayGenerator,
    rng: SimpleRng,
    colors: ColorBag,
    game_over: bool,
}

impl Session {
    /// New game with default tuning; the first tray is dealt at once
    pub fn new(seed: u32) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u32, tuning: Tuning) -> Self {
        Self::with_generator(seed, TrayGenerator::new(tuning))
    }

    pub fn with_generator(seed: u32, generator: TrayGenerator) -> Self {
        let mut session = Self {
            seed,
            grid: Grid::new(),
            tray: Tray::new(),
            tracker: GameTracker::new(),
            generator,
            rng: SimpleRng::new(seed),
            colors: ColorBag::new(seed),
            game_over: false,
        };
        session.request_tray_refill();
        session
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tray(&self) -> &Tray {
        &self.tray
    }

    pub fn tracker(&self) -> &GameTracker {
        &self.tracker
    }

    pub fn generator(&self) -> &TrayGenerator {
        &self.generator
    }

    pub fn library(&self) -> &ShapeLibrary {
        self.generator.library()
    }

    pub fn tuning(&self) -> &Tuning {
        self.generator.tuning()
    }

    pub fn score(&self) -> u32 {
        self.tracker.score()
    }

    pub fn combo(&self) -> u32 {
        self.tracker.combo()
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn phase(&self) -> GamePhase {
        self.tracker.phase(&self.tuning().phases, self.grid.fill_ratio())
    }

    /// Shape of the piece in `slot`
    pub fn slot_shape(&self, slot: usize) -> Option<&Shape> {
        self.tray.get(slot).and_then(|p| self.library().get(p.shape))
    }

    /// Replace the board, e.g. to set up a position
    pub fn load_board(&mut self, grid: Grid) {
        self.grid = grid;
        self.refresh_game_over();
    }

    /// Replace the tray, e.g. to set up a position
    pub fn load_tray(&mut self, tray: Tray) {
        self.tray = tray;
        self.refresh_game_over();
    }

    /// Place the piece in `slot` with its top-left at (row, col).
    ///
    /// Clears full lines, scores, and deals a new tray once the last piece of
    /// the current one is placed. A rejected request changes nothing.
    pub fn place_piece(
        &mut self,
        slot: usize,
        row: i8,
        col: i8,
    ) -> Result<PlaceOutcome, PlaceError> {
        let (piece, placement) = validate_place(
            &self.grid,
            &self.tray,
            self.generator.library(),
            self.game_over,
            slot,
            row,
            col,
        )?;
        let shape = self
            .generator
            .library()
            .get(piece.shape)
            .ok_or(PlaceError::SlotEmpty)?;
        if !self.grid.place(shape, row, col, piece.color) {
            return Err(PlaceError::Overlaps);
        }
        self.tray.take(slot);

        let cells = placement.mask.count_ones();
        let cleared = self.grid.clear_full_lines();
        let board_cleared = self.grid.is_empty();
        let rules = self.generator.tuning().scoring;
        let score = self
            .tracker
            .on_piece_placed(&rules, cells, cleared.count(), board_cleared);
        if !cleared.is_empty() {
            debug!(
                rows = cleared.rows.count_ones(),
                cols = cleared.cols.count_ones(),
                points = score.total,
                combo = self.tracker.combo(),
                board_cleared,
                "lines cleared"
            );
        }

        let refill = if self.tray.is_empty() {
            self.tracker.on_tray_complete(&rules);
            Some(self.request_tray_refill())
        } else {
            self.refresh_game_over();
            None
        };

        Ok(PlaceOutcome {
            piece,
            cells,
            cleared,
            score,
            board_cleared,
            refill,
            game_over: self.game_over,
        })
    }

    /// Fill every empty tray slot.
    ///
    /// When all slots were empty this is a full refill: special trays and
    /// the solvability guarantee apply and the tray count advances.
    pub fn request_tray_refill(&mut self) -> TrayDeal {
        let empty: ArrayVec<usize, TRAY_SIZE> = self.tray.empty_slots().collect();
        let mut ctx = GenerateContext {
            grid: self.grid.occupancy(),
            slots_to_fill: empty.len(),
            tracker: &mut self.tracker,
            rng: &mut self.rng,
        };
        let deal = self.generator.generate(&mut ctx);

        for (&slot, &shape) in empty.iter().zip(&deal.shapes) {
            let color = self.colors.next_color();
            self.tray.set(slot, TrayPiece { shape, color });
        }
        self.refresh_game_over();
        deal
    }

    /// Does any remaining tray piece fit? An empty tray counts as a move.
    pub fn has_any_legal_move(&self) -> bool {
        let shapes: Vec<&Shape> = self
            .tray
            .pieces()
            .filter_map(|(_, p)| self.library().get(p.shape))
            .collect();
        solver::has_any_legal_move(self.grid.occupancy(), &shapes)
    }

    fn refresh_game_over(&mut self) {
        let over = !self.has_any_legal_move();
        if over && !self.game_over {
            info!(
                seed = self.seed,
                score = self.tracker.score(),
                trays = self.tracker.tray_count(),
                lines = self.tracker.lines_cleared(),
                "game over"
            );
        }
        self.game_over = over;
    }

    /// New game on the same generator; the lifetime line count carries over
    pub fn restart(&mut self) {
        self.grid.clear();
        self.tray.clear();
        self.tracker.reset();
        self.game_over = false;
        self.request_tray_refill();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let slots = *self.tray.slots();
        SessionSnapshot {
            grid: self.grid.to_codes(),
            tray: slots.map(|slot| slot.map(Into::into)),
            score: self.tracker.score(),
            combo: self.tracker.combo(),
            tray_count: self.tracker.tray_count(),
            lines_cleared: self.tracker.lines_cleared(),
            total_lines_cleared_ever: self.tracker.total_lines_cleared_ever(),
            perfect_tray_count: self.tracker.perfect_tray_count(),
            phase: self.phase().as_str().to_string(),
            perfect_sequence: self.tracker.perfect_sequence().as_str().to_string(),
            game_over: self.game_over,
            seed: self.seed,
            rng_state: self.rng.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classic_blocks_core::occupancy::Occupancy;
    use classic_blocks_core::oracle::legal_placements;
    use classic_blocks_core::types::ShapeId;

    fn first_anchor(session: &Session, slot: usize) -> Option<(i8, i8)> {
        let shape = session.slot_shape(slot)?;
        legal_placements(session.grid().occupancy(), shape)
            .next()
            .map(|p| (p.row as i8, p.col as i8))
    }

    #[test]
    fn new_session_deals_a_full_tray() {
        let session = Session::new(7);
        assert!(session.tray().is_full());
        assert_eq!(session.tracker().tray_count(), 1);
        assert!(!session.game_over());
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn same_seed_same_game() {
        let a = Session::new(1234);
        let b = Session::new(1234);
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn snapshot_state_resumes_the_deal_sequence() {
        let mut session = Session::new(4242);
        let (row, col) = first_anchor(&session, 0).expect("empty board fits anything");
        session.place_piece(0, row, col).unwrap();

        let mut resumed = SimpleRng::new(session.snapshot().rng_state);
        let mut live = session.rng.clone();
        for _ in 0..8 {
            assert_eq!(resumed.next_u32(), live.next_u32());
        }
    }

    #[test]
    fn placing_the_whole_tray_deals_another() {
        let mut session = Session::new(99);
        let mut last = None;
        for slot in 0..TRAY_SIZE {
            let (row, col) = first_anchor(&session, slot).expect("empty board fits anything");
            last = Some(session.place_piece(slot, row, col).unwrap());
        }
        let outcome = last.unwrap();
        assert!(outcome.refill.is_some());
        assert!(session.tray().is_full());
        assert_eq!(session.tracker().tray_count(), 2);
    }

    #[test]
    fn rejected_placement_changes_nothing() {
        let mut session = Session::new(5);
        let before = session.snapshot();
        assert_eq!(session.place_piece(0, 8, 0), Err(PlaceError::OutOfBounds));
        assert_eq!(session.place_piece(4, 0, 0), Err(PlaceError::SlotOutOfRange));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn placement_scores_its_cells() {
        let mut session = Session::new(3);
        let mut tray = Tray::new();
        tray.set(0, TrayPiece { shape: ShapeId(4), color: 2 });
        tray.set(1, TrayPiece { shape: ShapeId(0), color: 2 });
        session.load_tray(tray);

        let outcome = session.place_piece(0, 0, 0).unwrap();
        assert_eq!(outcome.cells, 3);
        assert_eq!(outcome.score.total, 3);
        assert!(outcome.refill.is_none());
        assert_eq!(session.grid().get(0, 2), Some(Some(2)));
    }

    #[test]
    fn full_board_ends_the_game() {
        let mut session = Session::new(11);
        session.load_board(Grid::from_occupancy(Occupancy::FULL, 0));
        assert!(session.game_over());
        assert!(!session.has_any_legal_move());
        assert_eq!(session.place_piece(0, 0, 0), Err(PlaceError::GameOver));
    }

    #[test]
    fn restart_keeps_lifetime_lines() {
        let mut session = Session::new(21);
        session.load_board(Grid::from_rows(&["#######."], 0));
        let mut tray = Tray::new();
        tray.set(0, TrayPiece { shape: ShapeId(0), color: 0 });
        tray.set(1, TrayPiece { shape: ShapeId(0), color: 0 });
        session.load_tray(tray);

        let outcome = session.place_piece(0, 0, 7).unwrap();
        assert_eq!(outcome.lines_cleared(), 1);
        assert!(outcome.board_cleared);
        assert_eq!(session.tracker().total_lines_cleared_ever(), 1);

        session.restart();
        assert_eq!(session.score(), 0);
        assert_eq!(session.tracker().lines_cleared(), 0);
        assert_eq!(session.tracker().total_lines_cleared_ever(), 1);
        assert_eq!(session.tracker().tray_count(), 1);
        assert!(session.grid().is_empty());
    }
}
