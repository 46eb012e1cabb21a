//! Keyboard input: key-spec parsing and the terminal key source.

pub mod map;
pub mod reader;

pub use netris_types as types;

pub use map::{describe_key, map_keys, remap, KeyCollision, KeyMapError, KeyTable};
pub use reader::{key_to_byte, spawn_key_reader};
