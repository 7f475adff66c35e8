use serde::{Deserialize, Serialize};

use crate::tray::TrayPiece;
use crate::types::{GRID_COLS, GRID_ROWS, TRAY_SIZE};

/// A dealt piece as plain ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraySlotSnapshot {
    pub shape: u8,
    pub color: u8,
}

impl From<TrayPiece> for TraySlotSnapshot {
    fn from(value: TrayPiece) -> Self {
        Self {
            shape: value.shape.0,
            color: value.color,
        }
    }
}

/// Serializable view of a session, for frontends and logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// 0 = empty, `color + 1` otherwise
    pub grid: [[u8; GRID_COLS as usize]; GRID_ROWS as usize],
    pub tray: [Option<TraySlotSnapshot>; TRAY_SIZE],
    pub score: u32,
    pub combo: u32,
    pub tray_count: u32,
    pub lines_cleared: u32,
    pub total_lines_cleared_ever: u32,
    pub perfect_tray_count: u32,
    pub phase: String,
    pub perfect_sequence: String,
    pub game_over: bool,
    pub seed: u32,
    /// Dealer state; `SimpleRng::new(rng_state)` continues the deal sequence
    pub rng_state: u32,
}

impl SessionSnapshot {
    pub fn filled_cells(&self) -> usize {
        self.grid.iter().flatten().filter(|&&c| c != 0).count()
    }

    pub fn playable(&self) -> bool {
        !self.game_over
    }
}
