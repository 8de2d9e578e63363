//! Board, game state machine, and the minimax opponent.
//!
//! - [`Board`] — 6×7 grid with gravity drops and win detection
//! - [`Game`] — one match's full state machine
//! - [`Bot`] — adversarial search engine for the automated side
//! - [`GameError`] — rule-violation taxonomy

mod board;
mod bot;
mod error;
mod game;

pub use board::*;
pub use bot::*;
pub use error::*;
pub use game::*;
