use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use proptest::prelude::*;

use super::*;
use crate::channel::ChannelId;
use crate::constants::{MAX_AGE_DUMB_MS, MAX_AGE_RTC_MS, MAX_AGE_WS_MS};
use crate::protocol::{Protocol, Services};

fn key(byte: u8) -> IdentityKey {
    IdentityKey([byte; 32])
}

fn socket(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), port)
}

#[test]
fn equality_ignores_everything_but_identity() {
    let a = PeerAddress::new_gossiped(Protocol::Ws, key(1), Some(socket(1)), 10, Services::NONE);
    let b = PeerAddress::new_gossiped(
        Protocol::Ws,
        key(1),
        Some(socket(2)),
        999,
        Services::NETWORK,
    );
    assert_eq!(a, b);
}

#[test]
fn different_identities_are_unequal() {
    let a = PeerAddress::new_gossiped(Protocol::Ws, key(1), None, 0, Services::NONE);
    let b = PeerAddress::new_gossiped(Protocol::Ws, key(2), None, 0, Services::NONE);
    assert_ne!(a, b);
}

#[test]
fn seed_timestamp_is_pinned_at_zero() {
    let seed = PeerAddress::new_seed(Protocol::Ws, key(1), None, Services::NONE);
    assert!(seed.is_seed());
    assert_eq!(seed.timestamp, 0);
}

#[test]
fn mark_seed_pins_timestamp_and_sets_flag() {
    let mut addr = PeerAddress::new_gossiped(Protocol::Ws, key(1), None, 12_345, Services::NONE);
    assert!(!addr.is_seed());
    addr.mark_seed();
    assert!(addr.is_seed());
    assert_eq!(addr.timestamp, 0);
}

#[test]
fn exceeds_age_uses_protocol_specific_thresholds() {
    let ws = PeerAddress::new_gossiped(Protocol::Ws, key(1), None, 0, Services::NONE);
    let rtc = PeerAddress::new_rtc(key(2), SignalId(key(3)), 0, None, 0, Services::NONE);
    let dumb = PeerAddress::new_gossiped(Protocol::Dumb, key(4), None, 0, Services::NONE);

    assert!(!ws.exceeds_age(MAX_AGE_WS_MS));
    assert!(ws.exceeds_age(MAX_AGE_WS_MS + 1));

    assert!(!rtc.exceeds_age(MAX_AGE_RTC_MS));
    assert!(rtc.exceeds_age(MAX_AGE_RTC_MS + 1));

    assert!(!dumb.exceeds_age(MAX_AGE_DUMB_MS));
    assert!(dumb.exceeds_age(MAX_AGE_DUMB_MS + 1));
}

#[test]
fn route_prefers_lower_distance_then_newer_timestamp() {
    let near = Route {
        channel: ChannelId(1),
        distance: 1,
        timestamp: 10,
    };
    let far = Route {
        channel: ChannelId(2),
        distance: 2,
        timestamp: 100,
    };
    assert!(near.is_better_than(&far));
    assert!(!far.is_better_than(&near));

    let older_same_distance = Route {
        channel: ChannelId(3),
        distance: 1,
        timestamp: 5,
    };
    assert!(near.is_better_than(&older_same_distance));
}

proptest! {
    #[test]
    fn equality_is_reflexive_and_identity_scoped(a in any::<PeerAddress>(), b in any::<PeerAddress>()) {
        prop_assert_eq!(a == a.clone(), true);
        prop_assert_eq!(a == b, a.identity == b.identity);
    }
}
