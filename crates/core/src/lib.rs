//! Board model and pure game rules for the classic tray engine
//!
//! This crate holds everything that does not search: the board, the shape
//! catalog, the placement oracle, scoring, and session counters. It has no
//! I/O and no global state, so it is:
//!
//! - **Deterministic**: the same seed replays the same game
//! - **Testable**: every rule is a pure function or a small value type
//! - **Fast**: search-time queries run on a `u64` bitboard
//!
//! # Module Structure
//!
//! - [`occupancy`]: 8x8 bitboard snapshot used by every simulation
//! - [`grid`]: the live colored board with placement and line clearing
//! - [`shapes`]: the 42-piece catalog, tier classification, weighted sampling
//! - [`oracle`]: placement checks, simulated clears, cavities, line gaps
//! - [`rng`]: seeded LCG and the shuffled color bag
//! - [`scoring`]: placement, line-clear, and full-clear points
//! - [`tracker`]: tray/line/combo counters, phase and special-tray odds
//! - [`tray`]: the three dealt slots
//! - [`config`]: runtime tuning with serde defaults
//! - [`snapshot`]: serializable session view
//!
//! # Example
//!
//! ```
//! use classic_blocks_core::{oracle, Occupancy, ShapeLibrary};
//!
//! let library = ShapeLibrary::classic();
//! let single = library.get(classic_blocks_core::types::ShapeId(0)).unwrap();
//!
//! // Row 0 is missing only its first cell.
//! let grid = Occupancy::from_ascii(&[".#######"]);
//! assert!(oracle::can_place(grid, single, 0, 0));
//!
//! let placed = oracle::simulate_place(grid, single, 0, 0);
//! assert_eq!(oracle::count_cleared_lines(placed), 1);
//! assert!(oracle::simulate_clear_lines(placed).is_empty());
//! ```

pub mod config;
pub mod grid;
pub mod occupancy;
pub mod oracle;
pub mod rng;
pub mod scoring;
pub mod shapes;
pub mod snapshot;
pub mod tracker;
pub mod tray;

pub use classic_blocks_types as types;

// Re-export commonly used types for convenience
pub use config::Tuning;
pub use grid::{ClearedLines, Grid};
pub use occupancy::Occupancy;
pub use oracle::{Cavity, CavityMatch, LineGap};
pub use rng::{ColorBag, SimpleRng};
pub use scoring::ScoreResult;
pub use shapes::{Placement, Shape, ShapeError, ShapeLibrary};
pub use snapshot::{SessionSnapshot, TraySlotSnapshot};
pub use tracker::{GameTracker, PerfectPlan, PerfectSequence};
pub use tray::{Tray, TrayPiece};
