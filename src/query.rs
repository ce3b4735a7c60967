//! Filtered, scored snapshot queries over the store — the read path used
//! for outbound dialing and for gossiping addresses to other peers.
//!
//! Mirrors the multi-key ordering `MetaAddr`'s own `Ord` impl in
//! `meta_addr.rs` builds with `.then(...)` chains, generalized from
//! "reconnection order" to the spec's explicit scoring rule: fewest
//! failures first, most recently seen first, lowest RTC distance first.

use crate::address::PeerAddress;
use crate::config::BookConfig;
use crate::protocol::{ProtocolMask, Services};
use crate::record::{AddressRecord, State};
use crate::store::AddressStore;

/// Whether `record` is eligible to be returned by `query`, independent of
/// the scoring order it's returned in.
fn is_queryable(
    record: &AddressRecord,
    protocol_mask: ProtocolMask,
    service_mask: Services,
    config: &BookConfig,
    now: u64,
) -> bool {
    if matches!(record.state, State::Banned | State::Failed) {
        return false;
    }
    if record.address.is_seed() {
        return false;
    }
    if !protocol_mask.contains(record.address.protocol.mask_bit()) {
        return false;
    }
    if !record.address.services.contains(service_mask) {
        return false;
    }
    // NOTE: the source this crate is modeled on referenced
    // `this.address.exceedsAge()`, i.e. a method on the enclosing scope
    // rather than on the address value — almost certainly a bug. The
    // intended (and only sensible) check is on the address itself.
    if record
        .address
        .exceeds_age_threshold(now, config.max_age_ms(record.address.protocol))
    {
        return false;
    }
    true
}

/// Order candidates by ascending `failed_attempts`, then by descending
/// `last_seen` (most recent first), then by ascending RTC `distance`.
fn scoring_key(record: &AddressRecord) -> (u32, std::cmp::Reverse<u64>, u8) {
    let distance = record
        .routes
        .iter()
        .map(|r| r.distance)
        .min()
        .unwrap_or(record.address.distance);
    (
        record.failed_attempts,
        std::cmp::Reverse(record.last_seen),
        distance,
    )
}

/// Return up to `max_addresses` queryable addresses, refreshing the
/// timestamp of `Connected` records as they're read (spec.md §4.3: "For
/// `CONNECTED` records whose `address.timestamp` would otherwise be stale,
/// refresh `timestamp = now` before including"). This is why `query` takes
/// the store mutably even though it is conceptually a read path.
pub fn query(
    store: &mut AddressStore,
    protocol_mask: ProtocolMask,
    service_mask: Services,
    max_addresses: usize,
    config: &BookConfig,
    now: u64,
) -> Vec<PeerAddress> {
    for record in store.iter_mut().map(|(_, record)| record) {
        if record.state == State::Connected {
            record.address.timestamp = now;
        }
    }

    let mut candidates: Vec<&AddressRecord> = store
        .values()
        .filter(|record| is_queryable(record, protocol_mask, service_mask, config, now))
        .collect();

    candidates.sort_by_key(|record| scoring_key(record));
    candidates
        .into_iter()
        .take(max_addresses)
        .map(|record| record.address.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{IdentityKey, PeerAddress};
    use crate::protocol::Protocol;
    use crate::record::AddressRecord;

    fn key(byte: u8) -> IdentityKey {
        IdentityKey([byte; 32])
    }

    #[test]
    fn query_excludes_banned_failed_and_seed_and_stale() {
        let mut store = AddressStore::new();
        let config = BookConfig::default();

        let banned = PeerAddress::new_gossiped(Protocol::Ws, key(1), None, 100, Services::NONE);
        store.add(key(1), AddressRecord::new(banned, State::Banned, 100, 15_000));

        let failed = PeerAddress::new_gossiped(Protocol::Ws, key(2), None, 100, Services::NONE);
        store.add(key(2), AddressRecord::new(failed, State::Failed, 100, 15_000));

        let seed = PeerAddress::new_seed(Protocol::Ws, key(3), None, Services::NONE);
        store.add(key(3), AddressRecord::new(seed, State::New, 100, 15_000));

        let stale = PeerAddress::new_gossiped(Protocol::Ws, key(4), None, 0, Services::NONE);
        store.add(key(4), AddressRecord::new(stale, State::New, 0, 15_000));

        let good = PeerAddress::new_gossiped(Protocol::Ws, key(5), None, 100, Services::NONE);
        store.add(key(5), AddressRecord::new(good, State::New, 100, 15_000));

        let now = config.max_age_ws_ms + 50;
        let results = query(&mut store, ProtocolMask::ALL, Services::NONE, 1000, &config, now);
        assert_eq!(results, vec![PeerAddress::new_gossiped(
            Protocol::Ws,
            key(5),
            None,
            100,
            Services::NONE
        )]);
    }

    #[test]
    fn query_refreshes_connected_timestamp() {
        let mut store = AddressStore::new();
        let config = BookConfig::default();
        let addr = PeerAddress::new_gossiped(Protocol::Ws, key(1), None, 0, Services::NONE);
        store.add(key(1), AddressRecord::new(addr, State::Connected, 0, 15_000));

        query(&mut store, ProtocolMask::ALL, Services::NONE, 1000, &config, 999_999);
        assert_eq!(store.get(&key(1)).unwrap().address.timestamp, 999_999);
    }

    #[test]
    fn query_caps_at_max_addresses() {
        let mut store = AddressStore::new();
        let config = BookConfig::default();
        for i in 0..5u8 {
            let addr = PeerAddress::new_gossiped(Protocol::Ws, key(i), None, 100, Services::NONE);
            store.add(key(i), AddressRecord::new(addr, State::New, 100, 15_000));
        }
        let results = query(&mut store, ProtocolMask::ALL, Services::NONE, 2, &config, 100);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn scoring_prefers_fewer_failures_then_recency_then_distance() {
        let mut store = AddressStore::new();
        let config = BookConfig::default();

        let mut many_failures =
            AddressRecord::new(
                PeerAddress::new_gossiped(Protocol::Ws, key(1), None, 100, Services::NONE),
                State::New,
                100,
                15_000,
            );
        many_failures.failed_attempts = 5;
        store.add(key(1), many_failures);

        let clean = AddressRecord::new(
            PeerAddress::new_gossiped(Protocol::Ws, key(2), None, 100, Services::NONE),
            State::New,
            100,
            15_000,
        );
        store.add(key(2), clean);

        let results = query(&mut store, ProtocolMask::ALL, Services::NONE, 1000, &config, 100);
        assert_eq!(results[0].identity, key(2));
        assert_eq!(results[1].identity, key(1));
    }
}
