//! Peer transport protocols and the service/protocol bitmasks used to
//! filter [`crate::address::PeerAddress`] values.

use bitflags::bitflags;

/// The transport a peer address was learned over.
///
/// `Ws` covers direct TCP/WebSocket peers, `Rtc` covers WebRTC peers routed
/// through a signaling channel, and `Dumb` covers one-way clients that
/// cannot accept inbound connections.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(any(test, feature = "proptest-impl"), derive(proptest_derive::Arbitrary))]
pub enum Protocol {
    /// Direct TCP/WebSocket.
    Ws,
    /// WebRTC, routed over a signaling channel.
    Rtc,
    /// A one-way client that cannot accept inbound connections.
    Dumb,
}

bitflags! {
    /// A mask selecting which [`Protocol`]s a [`crate::query::query`] call
    /// should return.
    pub struct ProtocolMask: u8 {
        /// Include direct TCP/WebSocket peers.
        const WS = 0b001;
        /// Include WebRTC peers.
        const RTC = 0b010;
        /// Include dumb clients.
        const DUMB = 0b100;
        /// Every protocol.
        const ALL = Self::WS.bits | Self::RTC.bits | Self::DUMB.bits;
    }
}

impl Protocol {
    /// The single-bit mask this protocol sets in a [`ProtocolMask`].
    pub fn mask_bit(self) -> ProtocolMask {
        match self {
            Protocol::Ws => ProtocolMask::WS,
            Protocol::Rtc => ProtocolMask::RTC,
            Protocol::Dumb => ProtocolMask::DUMB,
        }
    }
}

bitflags! {
    /// Services a peer advertises. The concrete bit assignments are a
    /// matter for the higher application layer; the book only needs to
    /// test subset/superset relationships between masks.
    #[derive(Default)]
    pub struct Services: u64 {
        /// No advertised services.
        const NONE = 0;
        /// Basic network relay participation.
        const NETWORK = 0b0001;
        /// Participates in address gossip.
        const GOSSIP = 0b0010;
        /// Serves historical data to new peers.
        const ARCHIVE = 0b0100;
    }
}
