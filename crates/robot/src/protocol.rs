//! Robot line vocabulary.
//!
//! Commands go to the robot one per line; directives come back one per
//! line. Both are plain text, space separated.

use std::fmt;

use crate::types::{GameType, KeyAction};

/// Line sent to the robot process.
#[derive(Debug, Clone, PartialEq)]
pub enum RobotCommand {
    GameType(GameType),
    /// Board index (0 local, 1 opponent), visible rows, width.
    BoardSize { board: u8, visible: u8, width: u8 },
    Opponent { board: u8, name: String, host: String },
    /// `robot` or `fairRobot`.
    OpponentFlag { board: u8, flag: &'static str },
    /// Seconds per gravity step.
    TickLength(f64),
    BeginGame,
    /// Sequence number of the piece that just spawned.
    NewPiece(u32),
    /// A local key press, reported instead of acted on.
    UserKey { key: u8, action: Option<KeyAction> },
    Pause { local: bool, remote: bool },
    /// Seconds since the game started.
    TimeStamp(f64),
}

impl fmt::Display for RobotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotCommand::GameType(t) => write!(f, "GameType {}", t.as_str()),
            RobotCommand::BoardSize {
                board,
                visible,
                width,
            } => write!(f, "BoardSize {board} {visible} {width}"),
            RobotCommand::Opponent { board, name, host } => {
                write!(f, "Opponent {board} {name} {host}")
            }
            RobotCommand::OpponentFlag { board, flag } => write!(f, "OpponentFlag {board} {flag}"),
            RobotCommand::TickLength(secs) => write!(f, "TickLength {secs:.3}"),
            RobotCommand::BeginGame => write!(f, "BeginGame"),
            RobotCommand::NewPiece(n) => write!(f, "NewPiece {n}"),
            RobotCommand::UserKey { key, action } => write!(
                f,
                "UserKey {key} {}",
                action.map(|a| a.name()).unwrap_or("?")
            ),
            RobotCommand::Pause { local, remote } => {
                write!(f, "Pause {} {}", u8::from(*local), u8::from(*remote))
            }
            RobotCommand::TimeStamp(secs) => write!(f, "TimeStamp {secs:.3}"),
        }
    }
}

/// Line received from the robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotDirective {
    /// Perform a key action. `piece` is the number the robot tagged it with.
    Key {
        action: KeyAction,
        piece: Option<u32>,
    },
    Message(String),
}

impl RobotDirective {
    /// Parse one line. Unknown commands yield `None`.
    ///
    /// ```
    /// use netris_robot::RobotDirective;
    /// use netris_robot::types::KeyAction;
    ///
    /// assert_eq!(
    ///     RobotDirective::parse("Rotate 7"),
    ///     Some(RobotDirective::Key { action: KeyAction::Rotate, piece: Some(7) })
    /// );
    /// assert_eq!(RobotDirective::parse("Dance"), None);
    /// ```
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        if cmd == "Message" {
            return Some(RobotDirective::Message(rest.to_string()));
        }
        let action = KeyAction::from_name(cmd)?;
        let piece = rest
            .split_whitespace()
            .next()
            .and_then(|n| n.parse().ok());
        Some(RobotDirective::Key { action, piece })
    }

    /// Whether a key directive may act on the piece numbered `current`.
    /// Untagged directives are only honored outside fair mode.
    pub fn is_current(&self, fair: bool, current: u32) -> bool {
        match self {
            RobotDirective::Key { piece, .. } => !fair || *piece == Some(current),
            RobotDirective::Message(_) => true,
        }
    }
}
