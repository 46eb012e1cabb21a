//! Terminal display for netris.
//!
//! Drawing goes into a [`FrameBuffer`]; [`TerminalRenderer`] flushes only the
//! cells that changed since the last frame.

pub mod fb;
pub mod renderer;
pub mod screen;

pub use netris_core as core;
pub use netris_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
pub use screen::{ScreenOptions, TerminalDisplay};
