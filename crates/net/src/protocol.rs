//! Protocol module - binary packets exchanged between the two players
//!
//! Every packet is a 4-byte header followed by a type-specific payload:
//!
//! ```text
//! +-----------+-----------+------------------+
//! | type: u16 | len: u16  | payload          |
//! +-----------+-----------+------------------+
//! ```
//!
//! `len` counts the header too. All integers are big-endian. Each payload
//! has a fixed size per type (`startConn` has two valid sizes, `userName` is
//! bounded), and anything else is a [`DecodeError`].

use arrayvec::ArrayString;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::types::{ConnFlags, MAX_NAME_LEN};

/// Size of the type + length header.
pub const HEADER_LEN: usize = 4;

/// Largest frame accepted from a peer.
pub const MAX_PACKET_SIZE: usize = 512;

/// Wire tag of each packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PacketType {
    EndConn = 0,
    GiveJunk = 1,
    NewPiece = 2,
    Down = 3,
    Left = 4,
    Right = 5,
    Rotate = 6,
    Drop = 7,
    Clear = 8,
    InsertJunk = 9,
    StartConn = 10,
    UserName = 11,
    Pause = 12,
    Version = 13,
    ByeBye = 14,
}

impl PacketType {
    pub fn from_tag(tag: u16) -> Option<Self> {
        use PacketType::*;
        const ALL: [PacketType; 15] = [
            EndConn, GiveJunk, NewPiece, Down, Left, Right, Rotate, Drop, Clear, InsertJunk,
            StartConn, UserName, Pause, Version, ByeBye,
        ];
        ALL.get(tag as usize).copied()
    }

    pub fn tag(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown packet type {0}")]
    UnknownType(u16),
    #[error("frame length {0} is shorter than the header")]
    FrameTooShort(usize),
    #[error("frame length {0} exceeds {MAX_PACKET_SIZE}")]
    FrameTooLong(usize),
    #[error("{kind:?} payload has invalid length {len}")]
    BadLength { kind: PacketType, len: usize },
}

/// Handshake step 2 payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartConn {
    pub flags: ConnFlags,
    pub seed: i32,
    /// Gravity interval in microseconds; only sent from protocol 3 on.
    pub step_interval: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// The sender lost its game and is about to hang up.
    EndConn,
    GiveJunk { rows: i16 },
    NewPiece { shape: i16 },
    Down,
    Left,
    Right,
    Rotate,
    Drop,
    Clear,
    InsertJunk { rows: i16, column: i16 },
    StartConn(StartConn),
    /// Raw name bytes, NUL terminated on the wire.
    UserName(Bytes),
    Pause { paused: bool },
    Version { major: i32, protocol: i32 },
    /// The sender quit the program.
    ByeBye,
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::EndConn => PacketType::EndConn,
            Packet::GiveJunk { .. } => PacketType::GiveJunk,
            Packet::NewPiece { .. } => PacketType::NewPiece,
            Packet::Down => PacketType::Down,
            Packet::Left => PacketType::Left,
            Packet::Right => PacketType::Right,
            Packet::Rotate => PacketType::Rotate,
            Packet::Drop => PacketType::Drop,
            Packet::Clear => PacketType::Clear,
            Packet::InsertJunk { .. } => PacketType::InsertJunk,
            Packet::StartConn(_) => PacketType::StartConn,
            Packet::UserName(_) => PacketType::UserName,
            Packet::Pause { .. } => PacketType::Pause,
            Packet::Version { .. } => PacketType::Version,
            Packet::ByeBye => PacketType::ByeBye,
        }
    }

    /// Build a `userName` packet, truncating to fit the wire buffer.
    pub fn user_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let len = bytes.len().min(MAX_NAME_LEN - 1);
        Packet::UserName(Bytes::copy_from_slice(&bytes[..len]))
    }

    pub fn payload_len(&self) -> usize {
        match self {
            Packet::GiveJunk { .. } | Packet::NewPiece { .. } | Packet::Pause { .. } => 2,
            Packet::InsertJunk { .. } => 4,
            Packet::Version { .. } => 8,
            Packet::StartConn(sc) => {
                if sc.step_interval.is_some() {
                    12
                } else {
                    8
                }
            }
            Packet::UserName(name) => name.len() + 1,
            _ => 0,
        }
    }

    /// Append the framed packet to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        let len = HEADER_LEN + self.payload_len();
        dst.reserve(len);
        dst.put_u16(self.packet_type().tag());
        dst.put_u16(len as u16);
        match self {
            Packet::GiveJunk { rows } => dst.put_i16(*rows),
            Packet::NewPiece { shape } => dst.put_i16(*shape),
            Packet::Pause { paused } => dst.put_i16(i16::from(*paused)),
            Packet::InsertJunk { rows, column } => {
                dst.put_i16(*rows);
                dst.put_i16(*column);
            }
            Packet::Version { major, protocol } => {
                dst.put_i32(*major);
                dst.put_i32(*protocol);
            }
            Packet::StartConn(sc) => {
                dst.put_u32(sc.flags.bits());
                dst.put_i32(sc.seed);
                if let Some(interval) = sc.step_interval {
                    dst.put_i32(interval);
                }
            }
            Packet::UserName(name) => {
                dst.put_slice(name);
                dst.put_u8(0);
            }
            Packet::EndConn
            | Packet::Down
            | Packet::Left
            | Packet::Right
            | Packet::Rotate
            | Packet::Drop
            | Packet::Clear
            | Packet::ByeBye => {}
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode one payload of the given type.
    pub fn decode(kind: PacketType, mut payload: Bytes) -> Result<Packet, DecodeError> {
        let len = payload.len();
        let expect = |ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(DecodeError::BadLength { kind, len })
            }
        };

        let packet = match kind {
            PacketType::EndConn => expect(len == 0).map(|_| Packet::EndConn)?,
            PacketType::Down => expect(len == 0).map(|_| Packet::Down)?,
            PacketType::Left => expect(len == 0).map(|_| Packet::Left)?,
            PacketType::Right => expect(len == 0).map(|_| Packet::Right)?,
            PacketType::Rotate => expect(len == 0).map(|_| Packet::Rotate)?,
            PacketType::Drop => expect(len == 0).map(|_| Packet::Drop)?,
            PacketType::Clear => expect(len == 0).map(|_| Packet::Clear)?,
            PacketType::ByeBye => expect(len == 0).map(|_| Packet::ByeBye)?,
            PacketType::GiveJunk => {
                expect(len == 2)?;
                Packet::GiveJunk {
                    rows: payload.get_i16(),
                }
            }
            PacketType::NewPiece => {
                expect(len == 2)?;
                Packet::NewPiece {
                    shape: payload.get_i16(),
                }
            }
            PacketType::Pause => {
                expect(len == 2)?;
                Packet::Pause {
                    paused: payload.get_i16() != 0,
                }
            }
            PacketType::InsertJunk => {
                expect(len == 4)?;
                Packet::InsertJunk {
                    rows: payload.get_i16(),
                    column: payload.get_i16(),
                }
            }
            PacketType::Version => {
                expect(len == 8)?;
                Packet::Version {
                    major: payload.get_i32(),
                    protocol: payload.get_i32(),
                }
            }
            PacketType::StartConn => {
                expect(len == 8 || len == 12)?;
                let flags = ConnFlags::from_bits(payload.get_u32());
                let seed = payload.get_i32();
                let step_interval = (len == 12).then(|| payload.get_i32());
                Packet::StartConn(StartConn {
                    flags,
                    seed,
                    step_interval,
                })
            }
            PacketType::UserName => {
                expect(len <= MAX_NAME_LEN)?;
                let end = payload.iter().position(|&b| b == 0).unwrap_or(len);
                Packet::UserName(payload.split_to(end))
            }
        };
        Ok(packet)
    }
}

/// Opponent name as shown on screen.
pub type PeerName = ArrayString<MAX_NAME_LEN>;

/// Turn raw name bytes into printable text. Anything outside printable
/// ASCII becomes `?`; input past the name buffer is dropped.
///
/// ```
/// use netris_net::protocol::sanitize_name;
///
/// assert_eq!(sanitize_name(b"bob\x07").as_str(), "bob?");
/// ```
pub fn sanitize_name(raw: &[u8]) -> PeerName {
    let mut out = PeerName::new();
    for &b in raw.iter().take(MAX_NAME_LEN - 1) {
        out.push(printable(b));
    }
    out
}

/// Same treatment for free text (peer host, robot messages), without a
/// length limit.
pub fn sanitize_text(raw: &str) -> String {
    raw.bytes().map(printable).collect()
}

fn printable(b: u8) -> char {
    if b == b' ' || b.is_ascii_graphic() {
        b as char
    } else {
        '?'
    }
}

/// Take one complete frame off the front of `src`.
///
/// Returns `Ok(None)` when more bytes are needed; the buffer is left
/// untouched in that case.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Packet>, DecodeError> {
    if src.len() < HEADER_LEN {
        return Ok(None);
    }
    let tag = u16::from_be_bytes([src[0], src[1]]);
    let len = u16::from_be_bytes([src[2], src[3]]) as usize;

    let kind = PacketType::from_tag(tag).ok_or(DecodeError::UnknownType(tag))?;
    if len < HEADER_LEN {
        return Err(DecodeError::FrameTooShort(len));
    }
    if len > MAX_PACKET_SIZE {
        return Err(DecodeError::FrameTooLong(len));
    }
    if src.len() < len {
        src.reserve(len - src.len());
        return Ok(None);
    }

    let mut frame = src.split_to(len);
    frame.advance(HEADER_LEN);
    Packet::decode(kind, frame.freeze()).map(Some)
}
