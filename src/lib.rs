//! Otiyot: a two-player Hebrew word game on a 10x10 board
//!
//! Players take turns placing letters from their racks. Every new run of two
//! or more letters must be a dictionary word; each scores `(length - 1) * 2`.

pub mod app;
pub mod config;
pub mod error;
pub mod game;
pub mod storage;
pub mod tui;

pub use app::{GameSession, SessionEvent};
pub use error::TurnError;
pub use storage::{GameRecord, GameStore, PlayerId, Storage};
