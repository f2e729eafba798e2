//! Session state and screen flow

pub mod screen;
pub mod state;

pub use screen::{AppCoordinator, Direction, MenuOption, PlayView, Screen};
pub use state::{GameSession, SessionEvent};
