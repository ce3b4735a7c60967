//! An address-with-metadata type for P2P peer discovery.
//!
//! [`PeerAddress`] plays the role [`MetaAddr`][meta_addr] plays in a
//! Bitcoin-style network stack, generalized to three transports (direct,
//! WebRTC, and one-way "dumb" clients) instead of one.
//!
//! [meta_addr]: https://github.com/ZcashFoundation/zebra

use std::net::SocketAddr;

use crate::constants::{MAX_AGE_DUMB_MS, MAX_AGE_RTC_MS, MAX_AGE_WS_MS};
use crate::protocol::{Protocol, Services};

#[cfg(any(test, feature = "proptest-impl"))]
mod arbitrary;

#[cfg(test)]
mod tests;

/// A stable peer identity: the hash of the peer's public key.
///
/// Equality of two [`PeerAddress`] values is defined entirely in terms of
/// this key (see the `PartialEq` impl below), not any other field.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct IdentityKey(pub [u8; 32]);

impl std::fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityKey({})", hex::encode(&self.0[..8]))
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for IdentityKey {
    fn from(bytes: [u8; 32]) -> Self {
        IdentityKey(bytes)
    }
}

/// The identity a peer presents on the signaling plane, used to route
/// WebRTC handshake messages to it. Shares its representation with
/// [`IdentityKey`] because both are peer-identifying hashes, but is kept as
/// a distinct type so the two can't be accidentally interchanged.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct SignalId(pub IdentityKey);

impl std::fmt::Debug for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SignalId({})", self.0)
    }
}

/// A path to an RTC peer through one signaling channel.
///
/// The best route for a record is the one with the lowest `distance`, ties
/// broken by the most recent `timestamp` (see [`Route::is_better_than`]).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Route {
    /// The signaling channel this route goes through.
    pub channel: crate::channel::ChannelId,
    /// Hops from this node to the peer through signaling.
    pub distance: u8,
    /// When this route was last confirmed reachable.
    pub timestamp: u64,
}

impl Route {
    /// True if `self` should be preferred over `other` as the best route.
    pub fn is_better_than(&self, other: &Route) -> bool {
        match self.distance.cmp(&other.distance) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.timestamp > other.timestamp,
        }
    }
}

/// A peer address: identity, location, and the metadata needed to decide
/// whether it is safe to dial or gossip.
///
/// Two addresses are equal iff their [`IdentityKey`]s match; all other
/// fields are metadata that can be refreshed independently.
#[derive(Clone, Debug)]
pub struct PeerAddress {
    /// The transport this address was learned for.
    pub protocol: Protocol,
    /// The peer's stable identity.
    pub identity: IdentityKey,
    /// The peer's network location, if known.
    pub net_address: Option<SocketAddr>,
    /// Milliseconds since epoch; `0` marks a seed address.
    pub timestamp: u64,
    /// Services this peer advertises.
    pub services: Services,
    /// RTC only: the peer's signaling identity.
    pub signal_id: Option<SignalId>,
    /// RTC only: hops from this node through signaling.
    pub distance: u8,
    is_seed: bool,
}

impl PartialEq for PeerAddress {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}
impl Eq for PeerAddress {}

impl PeerAddress {
    /// Construct a direct (WS) or dumb-client address learned from the
    /// network (gossip, a DNS seeder, or a live connection).
    pub fn new_gossiped(
        protocol: Protocol,
        identity: IdentityKey,
        net_address: Option<SocketAddr>,
        timestamp: u64,
        services: Services,
    ) -> Self {
        PeerAddress {
            protocol,
            identity,
            net_address,
            timestamp,
            services,
            signal_id: None,
            distance: 0,
            is_seed: false,
        }
    }

    /// Construct an RTC address, reachable through a signaling identity.
    pub fn new_rtc(
        identity: IdentityKey,
        signal_id: SignalId,
        distance: u8,
        net_address: Option<SocketAddr>,
        timestamp: u64,
        services: Services,
    ) -> Self {
        PeerAddress {
            protocol: Protocol::Rtc,
            identity,
            net_address,
            timestamp,
            services,
            signal_id: Some(signal_id),
            distance,
            is_seed: false,
        }
    }

    /// Construct a seed address: a bootstrap peer known at startup.
    ///
    /// Seeds are never evicted and their timestamp is pinned to `0` for as
    /// long as they remain seeds.
    pub fn new_seed(
        protocol: Protocol,
        identity: IdentityKey,
        net_address: Option<SocketAddr>,
        services: Services,
    ) -> Self {
        PeerAddress {
            protocol,
            identity,
            net_address,
            timestamp: 0,
            services,
            signal_id: None,
            distance: 0,
            is_seed: true,
        }
    }

    /// Whether this address is a permanent bootstrap seed.
    pub fn is_seed(&self) -> bool {
        self.is_seed
    }

    /// Mark this address as a seed and pin its timestamp to `0`. Used when
    /// merging an incoming address into a record that is already known to
    /// be a seed (§4.2.1 rule 5): the seed attribute, once granted, is
    /// never lost on update.
    pub fn mark_seed(&mut self) {
        self.is_seed = true;
        self.timestamp = 0;
    }

    /// The maximum age this address may reach before [`Self::exceeds_age`]
    /// starts returning `true`.
    pub fn max_age_ms(&self) -> u64 {
        match self.protocol {
            Protocol::Ws => MAX_AGE_WS_MS,
            Protocol::Rtc => MAX_AGE_RTC_MS,
            Protocol::Dumb => MAX_AGE_DUMB_MS,
        }
    }

    /// True if this address was last seen too long ago to be trusted for
    /// dialing or gossip, against the default per-protocol age limits.
    /// Seeds have `timestamp = 0`, so unless `now` is implausibly small
    /// this is almost always `true` for them taken in isolation; callers
    /// that must never expire seeds (the housekeeper, `query`) check
    /// [`Self::is_seed`] separately rather than relying on this method to
    /// special-case it.
    pub fn exceeds_age(&self, now: u64) -> bool {
        self.exceeds_age_threshold(now, self.max_age_ms())
    }

    /// True if this address was last seen too long ago, against an
    /// explicit threshold (used when the caller has a [`crate::config::BookConfig`]
    /// whose per-protocol age limit may differ from the default).
    pub fn exceeds_age_threshold(&self, now: u64, max_age_ms: u64) -> bool {
        now.saturating_sub(self.timestamp) > max_age_ms
    }
}
