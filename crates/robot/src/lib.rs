//! Robot support: an external program that plays in place of the keyboard.

pub mod link;
pub mod protocol;

pub use netris_types as types;

pub use link::{RobotError, RobotLink, RobotSender};
pub use protocol::{RobotCommand, RobotDirective};
