//! Core game rules for netris: boards, pieces and match bookkeeping.
//!
//! Nothing in this crate does I/O. The engine crate drives it from events and
//! pushes the result out through the [`Display`] trait.

pub mod board;
pub mod display;
pub mod match_state;
pub mod pieces;
pub mod player;
pub mod rng;

pub use netris_types as types;

pub use board::{Board, BoardOverflow, ClearedRows};
pub use display::{Display, DisplayInfo, NullDisplay, ShownBoard};
pub use match_state::{GameOutcome, MatchState, PauseState, SessionState};
pub use pieces::{shape_cells, Piece, PieceShape};
pub use player::PlayerBoard;
pub use rng::SimpleRng;
