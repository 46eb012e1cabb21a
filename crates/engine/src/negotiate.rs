//! Session negotiation.
//!
//! Runs once per connection, before the first piece. Both ends perform the
//! same three exchanges (version, start parameters, user name) and the same
//! checks, so an incompatible pairing fails on both sides.

use thiserror::Error;

use crate::mux::{Event, EventMask, EventMux};
use crate::net::{
    sanitize_name, sanitize_text, Packet, PacketType, PeerName, PeerSender, StartConn,
};
use crate::types::{
    ConnFlags, DEFAULT_INTERVAL_US, MAJOR_VERSION, PROTOCOL_STEP_INTERVAL, PROTOCOL_VERSION,
};

/// Which end opened the connection. The server's seed is the shared one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// What this side brings to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSettings {
    pub flags: ConnFlags,
    pub seed: i32,
    pub interval_us: u32,
    pub name: String,
    /// Protocol revision to announce; lower than the current one only when
    /// imitating an older build.
    pub protocol_version: i32,
}

impl LocalSettings {
    pub fn new(flags: ConnFlags, seed: i32, interval_us: u32, name: impl Into<String>) -> Self {
        Self {
            flags,
            seed,
            interval_us,
            name: name.into(),
            protocol_version: PROTOCOL_VERSION,
        }
    }

    fn custom_interval(&self) -> bool {
        self.interval_us != DEFAULT_INTERVAL_US
    }
}

/// Agreed session parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    pub protocol: i32,
    pub seed: i32,
    pub opponent_flags: ConnFlags,
    pub opponent_name: PeerName,
    pub opponent_host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("Network negotiation failed")]
    ConnectionLost,
    #[error("Network negotiation failed: expected {expected:?}, got {got:?}")]
    Unexpected {
        expected: PacketType,
        got: PacketType,
    },
    #[error(
        "Your opponent is using an old, incompatible version\nof Netris.  They should get the latest version."
    )]
    OlderPeer,
    #[error("Your opponent is using a newer, incompatible version\nof Netris.  Get the latest version.")]
    NewerPeer,
    #[error(
        "Your opponent's version of Netris predates the -i option.\nFor fairness, you shouldn't use the -i option either."
    )]
    IntervalUnsupported,
    #[error("If one player sets the random number seed, both must.")]
    SeedFairness,
    #[error("Both players have set the random number seed, and they are unequal.")]
    SeedMismatch,
    #[error("Your opponent is using a different step-down interval (-i).\nYou must both use the same one.")]
    IntervalMismatch,
}

/// Run the handshake over an already connected link whose inbound packets
/// are registered with `mux`.
pub async fn negotiate(
    mux: &mut EventMux,
    peer: &PeerSender,
    local: &LocalSettings,
    role: Role,
    peer_host: &str,
) -> Result<Negotiated, NegotiationError> {
    // Version.
    peer.send(Packet::Version {
        major: MAJOR_VERSION,
        protocol: local.protocol_version,
    });
    let Packet::Version { major, protocol } = expect(mux, PacketType::Version).await? else {
        return Err(NegotiationError::ConnectionLost);
    };
    if major < MAJOR_VERSION {
        return Err(NegotiationError::OlderPeer);
    }
    if major > MAJOR_VERSION {
        return Err(NegotiationError::NewerPeer);
    }
    let protocol = protocol.min(local.protocol_version);
    log::debug!("negotiated protocol {protocol}");

    if protocol < PROTOCOL_STEP_INTERVAL && local.custom_interval() {
        return Err(NegotiationError::IntervalUnsupported);
    }

    // Start parameters.
    let interval = i32::try_from(local.interval_us).unwrap_or(i32::MAX);
    peer.send(Packet::StartConn(StartConn {
        flags: local.flags,
        seed: local.seed,
        step_interval: (protocol >= PROTOCOL_STEP_INTERVAL).then_some(interval),
    }));
    let Packet::StartConn(theirs) = expect(mux, PacketType::StartConn).await? else {
        return Err(NegotiationError::ConnectionLost);
    };

    let my_seed_set = local.flags.contains(ConnFlags::SET_SEED);
    if theirs.flags.contains(ConnFlags::SET_SEED) != my_seed_set {
        return Err(NegotiationError::SeedFairness);
    }
    if my_seed_set && theirs.seed != local.seed {
        return Err(NegotiationError::SeedMismatch);
    }
    if protocol >= PROTOCOL_STEP_INTERVAL && theirs.step_interval != Some(interval) {
        return Err(NegotiationError::IntervalMismatch);
    }
    let seed = match role {
        Role::Server => local.seed,
        Role::Client => theirs.seed,
    };

    // User name.
    peer.send(Packet::user_name(&local.name));
    let Packet::UserName(raw) = expect(mux, PacketType::UserName).await? else {
        return Err(NegotiationError::ConnectionLost);
    };

    let negotiated = Negotiated {
        protocol,
        seed,
        opponent_flags: theirs.flags,
        opponent_name: sanitize_name(&raw),
        opponent_host: sanitize_text(peer_host),
    };
    log::info!(
        "playing {} on {} (protocol {}, seed {})",
        negotiated.opponent_name,
        negotiated.opponent_host,
        protocol,
        seed
    );
    Ok(negotiated)
}

async fn expect(mux: &mut EventMux, expected: PacketType) -> Result<Packet, NegotiationError> {
    match mux.wait_event(EventMask::NET).await {
        Event::Net(packet) if packet.packet_type() == expected => Ok(packet),
        Event::Net(packet) => Err(NegotiationError::Unexpected {
            expected,
            got: packet.packet_type(),
        }),
        _ => Err(NegotiationError::ConnectionLost),
    }
}
