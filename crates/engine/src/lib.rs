//! Netris engine: gravity timer, event multiplexer, session negotiation and
//! the game loop.
//!
//! Everything runs on one task. The only suspension point during play is
//! [`EventMux::wait_event`]; background tasks only move bytes into channels.

pub mod config;
pub mod game;
pub mod mux;
pub mod negotiate;
pub mod session;
pub mod timer;

pub use netris_core as core;
pub use netris_input as input;
pub use netris_net as net;
pub use netris_robot as robot;
pub use netris_types as types;

pub use config::{ConfigError, GameConfig, NetMode};
pub use game::{Game, GameSetup, Opponent};
pub use mux::{Event, EventMask, EventMux};
pub use negotiate::{negotiate, LocalSettings, Negotiated, NegotiationError, Role};
pub use session::{play, run, GAME_OVER_GRACE};
pub use timer::GravityTimer;
