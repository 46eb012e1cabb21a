//! Two-player networking: the packet codec and the TCP link to the peer.

pub mod link;
pub mod protocol;

pub use netris_types as types;

pub use link::{NetError, NetLink, PeerSender};
pub use protocol::{
    decode_frame, sanitize_name, sanitize_text, DecodeError, Packet, PacketType, PeerName,
    StartConn, HEADER_LEN, MAX_PACKET_SIZE,
};
