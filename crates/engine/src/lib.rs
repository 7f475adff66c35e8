//! Tray search and the game session for the classic tray engine
//!
//! Everything that searches lives here: the permutation solver, the exhaustive
//! clear check, the good-tray and 3+3 searches, and the generator that picks
//! between them. [`Session`] ties the generator to a live board and tray.
//!
//! # Module Structure
//!
//! - [`policy`]: per-anchor scoring and the greedy / lookahead placement policies
//! - [`solver`]: six-ordering tray simulation, exhaustive clear check, fit scores
//! - [`good`]: tiered good-tray searches
//! - [`perfect`]: 3+3 board-clear planning
//! - [`generator`]: the refill ladder and the baseline guarantee loop
//! - [`place`]: placement validation and errors
//! - [`session`]: one game, driven by placements and refills
//!
//! # Example
//!
//! ```
//! use classic_blocks_engine::Session;
//!
//! let mut session = Session::new(42);
//! assert!(session.tray().is_full());
//!
//! // Drop the first piece at its first legal anchor.
//! let shape = session.slot_shape(0).unwrap();
//! let anchor = shape.placements()[0];
//! let outcome = session
//!     .place_piece(0, anchor.row as i8, anchor.col as i8)
//!     .unwrap();
//! assert_eq!(session.score(), outcome.score.total);
//! ```

pub mod generator;
pub mod good;
pub mod perfect;
pub mod place;
pub mod policy;
pub mod session;
pub mod solver;

pub use generator::{GenerateContext, GuaranteeStatus, TrayDeal, TrayGenerator};
pub use good::GoodTray;
pub use place::{PlaceError, PlaceOutcome};
pub use policy::{GreedyPolicy, LookaheadPolicy, PlacementPolicy, Policy};
pub use session::Session;
pub use solver::TrayOutcome;
