//! Channel identity.
//!
//! The book never owns a live connection; sockets, WebRTC data channels and
//! signaling links are owned by the connection manager. The book only ever
//! needs to compare "is this the same channel", so routes and disconnect
//! events carry a lightweight [`ChannelId`] rather than a borrowed or
//! reference-counted handle. This avoids tying the book's lifetime to any
//! particular transport's connection type.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ChannelId(pub u64);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "channel:{:x}", self.0)
    }
}

impl From<u64> for ChannelId {
    fn from(id: u64) -> Self {
        ChannelId(id)
    }
}
