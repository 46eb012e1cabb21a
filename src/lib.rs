//! Netris (workspace facade crate).
//!
//! Re-exports the workspace crates under short names so the binary, the
//! integration tests and the benches share one import path.

pub use netris_core as core;
pub use netris_engine as engine;
pub use netris_input as input;
pub use netris_net as net;
pub use netris_robot as robot;
pub use netris_term as term;
pub use netris_types as types;
