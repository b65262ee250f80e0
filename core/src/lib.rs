//! Minesweeper game engine.
//!
//! [`GameEngine`] holds the current [`GameState`] snapshot and applies player
//! commands to it: reveal with breadth-first flood-fill, flag toggling,
//! chording and hints. Mines are laid on the first reveal so the opening move
//! and its neighbors are always safe. [`GameSession`] wraps an engine and
//! keeps its clock ticking on a tokio runtime while a game is in progress.

pub use board::*;
pub use clock::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use observer::{Snapshot, SubscriptionId};
pub use session::*;
pub use settings::*;
pub use state::*;
pub use tile::*;
pub use types::*;

pub(crate) use observer::Observers;

mod board;
mod clock;
mod engine;
mod error;
mod generator;
mod observer;
mod session;
mod settings;
mod state;
mod tile;
mod types;
