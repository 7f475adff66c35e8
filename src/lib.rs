//! Classic block-puzzle tray engine (workspace facade crate).
//!
//! The implementation lives in dedicated crates under `crates/`; this package
//! re-exports them as `classic_blocks::{types, core, engine}` and adds the
//! headless [`autoplay`] driver used by the binary.

pub use classic_blocks_core as core;
pub use classic_blocks_engine as engine;
pub use classic_blocks_types as types;

pub mod autoplay;
