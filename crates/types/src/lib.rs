//! Shared types and constants for netris.
//!
//! This crate has no dependencies. Everything that both sides of a match must
//! agree on (version numbers, shape numbering, connection flags) lives here.

/// Default board width in cells.
pub const DEFAULT_BOARD_WIDTH: u8 = 10;

/// Default number of visible rows.
pub const DEFAULT_BOARD_VISIBLE: u8 = 20;

/// Rows kept above the visible field for spawning and junk overflow.
pub const HIDDEN_ROWS: u8 = 4;

/// Widest board the engine supports.
pub const MAX_BOARD_WIDTH: u8 = 32;

/// Tallest board (visible + hidden) the engine supports.
pub const MAX_BOARD_HEIGHT: u8 = 64;

/// Incompatible protocol changes bump this.
pub const MAJOR_VERSION: i32 = 1;

/// Highest protocol revision this build speaks.
///
/// Revision 3 added the step interval to `startConn`.
pub const PROTOCOL_VERSION: i32 = 3;

/// First protocol revision carrying the step interval.
pub const PROTOCOL_STEP_INTERVAL: i32 = 3;

/// Default gravity interval in microseconds (0.3 s per row).
pub const DEFAULT_INTERVAL_US: u32 = 300_000;

/// Each "faster" keypress multiplies the interval by this factor.
pub const FASTER_FACTOR: f64 = 0.8;

/// Default TCP port for two-player games.
pub const DEFAULT_PORT: u16 = 9284;

/// Size of the user-name buffer on the wire, terminator included.
pub const MAX_NAME_LEN: usize = 16;

/// Default key spec, one character per [`KeyAction`] in declaration order.
pub const DEFAULT_KEYS: &str = "jJklL mspf^lnq";

/// The seven piece shapes.
///
/// The discriminant is the shape number used on the wire by `newPiece`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeId {
    I = 0,
    O = 1,
    T = 2,
    S = 3,
    Z = 4,
    J = 5,
    L = 6,
}

impl ShapeId {
    pub const ALL: [ShapeId; 7] = [
        ShapeId::I,
        ShapeId::O,
        ShapeId::T,
        ShapeId::S,
        ShapeId::Z,
        ShapeId::J,
        ShapeId::L,
    ];

    /// Decode a wire shape number.
    ///
    /// ```
    /// use netris_types::ShapeId;
    ///
    /// assert_eq!(ShapeId::from_net(0), Some(ShapeId::I));
    /// assert_eq!(ShapeId::from_net(6), Some(ShapeId::L));
    /// assert_eq!(ShapeId::from_net(7), None);
    /// assert_eq!(ShapeId::from_net(-1), None);
    /// ```
    pub fn from_net(n: i16) -> Option<Self> {
        usize::try_from(n).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn to_net(self) -> i16 {
        self as i16
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeId::I => "I",
            ShapeId::O => "O",
            ShapeId::T => "T",
            ShapeId::S => "S",
            ShapeId::Z => "Z",
            ShapeId::J => "J",
            ShapeId::L => "L",
        }
    }
}

/// Orientation of a piece, cycling North → East → South → West.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    North,
    East,
    South,
    West,
}

impl Orientation {
    pub fn rotate_cw(&self) -> Self {
        match self {
            Orientation::North => Orientation::East,
            Orientation::East => Orientation::South,
            Orientation::South => Orientation::West,
            Orientation::West => Orientation::North,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Orientation::North => 0,
            Orientation::East => 1,
            Orientation::South => 2,
            Orientation::West => 3,
        }
    }
}

/// What a permanent board cell is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    /// Frozen cell of a piece.
    Piece(ShapeId),
    /// Penalty row granted by the opponent.
    Junk,
}

/// A board cell: `None` is empty.
pub type Cell = Option<BlockType>;

/// Which of the two boards on screen.
///
/// Local input only ever touches [`BoardId::Local`]; network packets only
/// ever touch [`BoardId::Remote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardId {
    Local = 0,
    Remote = 1,
}

impl BoardId {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Logical actions that can be bound to a key.
///
/// Declaration order is the order of characters in a key spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Left,
    FullLeft,
    Rotate,
    Right,
    FullRight,
    Drop,
    Down,
    ToggleSpy,
    Pause,
    Faster,
    Redraw,
    New,
    Quit,
}

impl KeyAction {
    pub const COUNT: usize = 13;

    pub const ALL: [KeyAction; KeyAction::COUNT] = [
        KeyAction::Left,
        KeyAction::FullLeft,
        KeyAction::Rotate,
        KeyAction::Right,
        KeyAction::FullRight,
        KeyAction::Drop,
        KeyAction::Down,
        KeyAction::ToggleSpy,
        KeyAction::Pause,
        KeyAction::Faster,
        KeyAction::Redraw,
        KeyAction::New,
        KeyAction::Quit,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in diagnostics and in the robot protocol.
    pub fn name(&self) -> &'static str {
        match self {
            KeyAction::Left => "Left",
            KeyAction::FullLeft => "FullLeft",
            KeyAction::Rotate => "Rotate",
            KeyAction::Right => "Right",
            KeyAction::FullRight => "FullRight",
            KeyAction::Drop => "Drop",
            KeyAction::Down => "Down",
            KeyAction::ToggleSpy => "ToggleSpy",
            KeyAction::Pause => "Pause",
            KeyAction::Faster => "Faster",
            KeyAction::Redraw => "Redraw",
            KeyAction::New => "New",
            KeyAction::Quit => "Quit",
        }
    }

    /// Exact (case-sensitive) lookup by robot-protocol name.
    ///
    /// ```
    /// use netris_types::KeyAction;
    ///
    /// assert_eq!(KeyAction::from_name("FullLeft"), Some(KeyAction::FullLeft));
    /// assert_eq!(KeyAction::from_name("fullleft"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }
}

/// Game flavour, reported to the robot as `GameType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameType {
    OnePlayer,
    ClassicTwo,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::OnePlayer => "OnePlayer",
            GameType::ClassicTwo => "ClassicTwo",
        }
    }
}

/// Flags word exchanged in `startConn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ConnFlags(u32);

impl ConnFlags {
    pub const USING_ROBOT: ConnFlags = ConnFlags(0x1);
    pub const FAIR_ROBOT: ConnFlags = ConnFlags(0x2);
    pub const SET_SEED: ConnFlags = ConnFlags(0x4);

    pub const fn empty() -> Self {
        ConnFlags(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        ConnFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: ConnFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: ConnFlags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for ConnFlags {
    type Output = ConnFlags;

    fn bitor(self, rhs: ConnFlags) -> ConnFlags {
        ConnFlags(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_constants() {
        assert_eq!(MAJOR_VERSION, 1);
        assert_eq!(PROTOCOL_VERSION, 3);
        assert_eq!(DEFAULT_INTERVAL_US, 300_000);
        assert_eq!(DEFAULT_PORT, 9284);
    }

    #[test]
    fn default_keys_cover_every_action() {
        // "^l" is a single key.
        assert_eq!(DEFAULT_KEYS.len() - 1, KeyAction::COUNT);
    }

    #[test]
    fn shape_net_numbers_roundtrip() {
        for shape in ShapeId::ALL {
            assert_eq!(ShapeId::from_net(shape.to_net()), Some(shape));
        }
    }

    #[test]
    fn key_action_index_matches_declaration_order() {
        for (i, action) in KeyAction::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
            assert_eq!(KeyAction::from_name(action.name()), Some(*action));
        }
    }

    #[test]
    fn conn_flags() {
        let mut flags = ConnFlags::empty();
        assert!(!flags.contains(ConnFlags::SET_SEED));
        flags.insert(ConnFlags::SET_SEED);
        assert!(flags.contains(ConnFlags::SET_SEED));
        assert_eq!((ConnFlags::USING_ROBOT | ConnFlags::FAIR_ROBOT).bits(), 3);
    }
}
