use classic_blocks_core::grid::{ClearedLines, Grid};
use classic_blocks_core::scoring::ScoreResult;
use classic_blocks_core::shapes::{Placement, ShapeLibrary};
use classic_blocks_core::tray::{Tray, TrayPiece};
use classic_blocks_core::types::{ScoreReason, TRAY_SIZE};

use crate::generator::TrayDeal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    #[error("slot index is outside the tray")]
    SlotOutOfRange,
    #[error("slot holds no piece")]
    SlotEmpty,
    #[error("piece would leave the board")]
    OutOfBounds,
    #[error("piece would overlap filled cells")]
    Overlaps,
    #[error("game is over")]
    GameOver,
}

impl PlaceError {
    pub fn code(self) -> &'static str {
        match self {
            PlaceError::SlotOutOfRange | PlaceError::SlotEmpty => "invalid_slot",
            PlaceError::OutOfBounds | PlaceError::Overlaps => "invalid_place",
            PlaceError::GameOver => "not_playable",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            PlaceError::SlotOutOfRange => "slot index is outside the tray",
            PlaceError::SlotEmpty => "slot holds no piece",
            PlaceError::OutOfBounds => "piece would leave the board",
            PlaceError::Overlaps => "piece would overlap filled cells",
            PlaceError::GameOver => "game is over",
        }
    }
}

/// What one committed placement did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOutcome {
    pub piece: TrayPiece,
    pub cells: u32,
    pub cleared: ClearedLines,
    pub score: ScoreResult,
    pub board_cleared: bool,
    /// Set when this placement emptied the tray and a new one was dealt
    pub refill: Option<TrayDeal>,
    pub game_over: bool,
}

impl PlaceOutcome {
    pub fn lines_cleared(&self) -> u32 {
        self.cleared.count()
    }

    /// Non-zero score parts, in award order
    pub fn awards(&self) -> impl Iterator<Item = (ScoreReason, u32)> {
        [
            (ScoreReason::Placement, self.score.placement),
            (ScoreReason::LineClear, self.score.line_clear),
            (ScoreReason::FullClear, self.score.full_clear),
        ]
        .into_iter()
        .filter(|&(_, points)| points > 0)
    }
}

/// Check a placement request without touching the board or tray
pub fn validate_place(
    grid: &Grid,
    tray: &Tray,
    library: &ShapeLibrary,
    game_over: bool,
    slot: usize,
    row: i8,
    col: i8,
) -> Result<(TrayPiece, Placement), PlaceError> {
    if game_over {
        return Err(PlaceError::GameOver);
    }
    if slot >= TRAY_SIZE {
        return Err(PlaceError::SlotOutOfRange);
    }
    let piece = tray.get(slot).ok_or(PlaceError::SlotEmpty)?;
    let shape = library.get(piece.shape).ok_or(PlaceError::SlotEmpty)?;

    // Empty shapes have no anchors and fit nowhere.
    let placement = shape
        .placement_at(row, col)
        .ok_or(PlaceError::OutOfBounds)?;
    if grid.occupancy().overlaps(placement.mask) {
        return Err(PlaceError::Overlaps);
    }
    Ok((piece, placement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use classic_blocks_core::types::ShapeId;

    fn tray_with(shape: u8) -> Tray {
        let mut tray = Tray::new();
        tray.set(0, TrayPiece { shape: ShapeId(shape), color: 1 });
        tray
    }

    #[test]
    fn rejected_when_game_over() {
        let library = ShapeLibrary::classic();
        let err = validate_place(&Grid::new(), &tray_with(0), &library, true, 0, 0, 0).unwrap_err();
        assert_eq!(err, PlaceError::GameOver);
        assert_eq!(err.code(), "not_playable");
    }

    #[test]
    fn rejected_for_bad_slots() {
        let library = ShapeLibrary::classic();
        let tray = tray_with(0);
        assert_eq!(
            validate_place(&Grid::new(), &tray, &library, false, 3, 0, 0),
            Err(PlaceError::SlotOutOfRange)
        );
        assert_eq!(
            validate_place(&Grid::new(), &tray, &library, false, 1, 0, 0),
            Err(PlaceError::SlotEmpty)
        );
    }

    #[test]
    fn rejected_out_of_bounds() {
        let library = ShapeLibrary::classic();
        // Horizontal triomino anchored at column 6 spills past column 7.
        let tray = tray_with(4);
        assert_eq!(
            validate_place(&Grid::new(), &tray, &library, false, 0, 0, 6),
            Err(PlaceError::OutOfBounds)
        );
        assert_eq!(
            validate_place(&Grid::new(), &tray, &library, false, 0, -1, 0),
            Err(PlaceError::OutOfBounds)
        );
    }

    #[test]
    fn rejected_on_overlap() {
        let library = ShapeLibrary::classic();
        let grid = Grid::from_rows(&["..#....."], 0);
        let tray = tray_with(4);
        let err = validate_place(&grid, &tray, &library, false, 0, 0, 0).unwrap_err();
        assert_eq!(err, PlaceError::Overlaps);
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn accepted_placement_reports_its_footprint() {
        let library = ShapeLibrary::classic();
        let tray = tray_with(4);
        let (piece, placement) =
            validate_place(&Grid::new(), &tray, &library, false, 0, 2, 5).unwrap();
        assert_eq!(piece.shape, ShapeId(4));
        assert_eq!(placement.mask.count_ones(), 3);
        assert_eq!((placement.row, placement.col), (2, 5));
    }
}
