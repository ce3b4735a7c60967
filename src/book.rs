//! The state machine: admission, lifecycle transitions, and the `added`
//! observer notification.
//!
//! `AddressBook` is the collaborator `zebra-network`'s own
//! `peer_set/candidate_set.rs` expects behind an `Arc<Mutex<..>>`
//! (`contains_addr`, `extend`, `reconnection_peers`, `update`); this is
//! that collaborator, generalized from a single-transport candidate set to
//! the full admission/ban/routing state machine spec.md describes.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::address::{IdentityKey, PeerAddress, Route};
use crate::channel::ChannelId;
use crate::config::BookConfig;
use crate::error::BookError;
use crate::event::Event;
use crate::platform::OnlineStatus;
use crate::protocol::{ProtocolMask, Services};
use crate::query;
use crate::record::{AddressRecord, State};
use crate::store::AddressStore;


/// The capacity of the `added` broadcast channel. Lagging subscribers drop
/// the oldest notifications rather than block the book; this only affects
/// how much history a slow listener can catch up on, not correctness of
/// the store itself.
const ADDED_CHANNEL_CAPACITY: usize = 256;

/// The in-memory peer address registry, state machine, and query surface.
pub struct AddressBook {
    store: AddressStore,
    self_address: PeerAddress,
    config: BookConfig,
    online: Arc<dyn OnlineStatus>,
    added_tx: broadcast::Sender<Vec<PeerAddress>>,
}

impl AddressBook {
    /// Construct a book for `self_address`, admitting `seeds` immediately
    /// (spec.md §4.5: seed initialization flows through `add` with
    /// `channel = None`, the same as any other caller).
    pub fn new(
        self_address: PeerAddress,
        seeds: Vec<PeerAddress>,
        config: BookConfig,
        online: Arc<dyn OnlineStatus>,
        now: u64,
    ) -> Result<Self, BookError> {
        if config.initial_failed_backoff_ms > config.max_failed_backoff_ms {
            return Err(BookError::InvalidBackoffConfig {
                initial: config.initial_failed_backoff_ms,
                max: config.max_failed_backoff_ms,
            });
        }

        // A seed equal to `self_address` is rejected by `admit`'s rule 1
        // (self-guard) the same as any other self-matching address; it is
        // not grounds to fail construction of the whole book, which would
        // also discard every other, legitimate seed in the same batch.
        let (added_tx, _rx) = broadcast::channel(ADDED_CHANNEL_CAPACITY);
        let mut book = AddressBook {
            store: AddressStore::new(),
            self_address,
            config,
            online,
            added_tx,
        };
        book.add(None, seeds, now);
        Ok(book)
    }

    /// Subscribe to the `added` notification stream: batches of addresses
    /// that just became queryable (fresh admissions or housekeeper
    /// unbans).
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<PeerAddress>> {
        self.added_tx.subscribe()
    }

    /// The number of records currently being connected to.
    pub fn connecting_count(&self) -> usize {
        self.store.connecting_count()
    }

    /// The total number of records in the store.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// True if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // ---- admission (spec.md §4.2.1) -----------------------------------

    /// Admit one or more addresses, as learned over `channel` (`None` for
    /// seeds or other channel-less sources). Returns the number of
    /// addresses that were genuinely new; those addresses (and only those)
    /// are broadcast in a single `added` notification once the whole batch
    /// is integrated (spec.md §5).
    pub fn add(
        &mut self,
        channel: Option<ChannelId>,
        addresses: impl IntoIterator<Item = PeerAddress>,
        now: u64,
    ) -> usize {
        let mut newly_added = Vec::new();
        for address in addresses {
            if let Some(AdmitOutcome::Created(addr)) = self.admit(channel, address, now) {
                newly_added.push(addr);
            }
        }
        metrics::gauge!("peer_book_store_size", self.store.len() as f64);
        if !newly_added.is_empty() {
            let count = newly_added.len();
            // A send error just means there are currently no subscribers;
            // the batch was still integrated into the store.
            let _ = self.added_tx.send(newly_added);
            return count;
        }
        0
    }

    /// Run the seven admission rules of spec.md §4.2.1 against a single
    /// address. Returns `None` for a silent reject, `Some(Updated(_))`
    /// when an already-known record was mutated without becoming newly
    /// queryable, and `Some(Created(_))` when a brand-new record was
    /// admitted.
    fn admit(&mut self, channel: Option<ChannelId>, mut addr: PeerAddress, now: u64) -> Option<AdmitOutcome> {
        // 1. Self-guard.
        if addr == self.self_address {
            tracing::debug!(identity = %addr.identity, "rejecting self address");
            return None;
        }

        // 2. Age guard. Seeds flow in with `channel = None` and bypass
        // this entirely, matching spec.md's note that this is exactly how
        // seed admission survives an otherwise-stale `timestamp = 0`.
        if channel.is_some()
            && addr.exceeds_age_threshold(now, self.config.max_age_ms(addr.protocol))
        {
            tracing::debug!(identity = %addr.identity, "rejecting address that exceeds max age");
            return None;
        }

        // 3. Future-timestamp guard.
        if addr.timestamp > now.saturating_add(self.config.max_timestamp_drift_ms) {
            tracing::debug!(identity = %addr.identity, "rejecting address with future timestamp");
            return None;
        }

        // 4. RTC hop accounting.
        if addr.protocol == crate::protocol::Protocol::Rtc {
            addr.distance = addr.distance.saturating_add(1);
            if addr.distance > self.config.max_distance {
                if let Some(ch) = channel {
                    let now_empty = match self.store.get_mut(&addr.identity) {
                        Some(record) => {
                            record.remove_route_by_channel(ch);
                            record.routes.is_empty()
                        }
                        None => false,
                    };
                    if now_empty {
                        self.remove_record(&addr.identity, now);
                    }
                }
                tracing::debug!(
                    identity = %addr.identity,
                    distance = addr.distance,
                    "rejecting over-distance RTC address"
                );
                return None;
            }
        }

        // 5. Known address merge.
        let known = self
            .store
            .get(&addr.identity)
            .map(|record| (record.state, record.address.clone()));
        if let Some((state, known_addr)) = &known {
            if *state == State::Banned {
                tracing::debug!(identity = %addr.identity, "rejecting update to a banned address");
                return None;
            }
            if known_addr.is_seed() {
                addr.mark_seed();
            }
            if addr.net_address.is_none() {
                addr.net_address = known_addr.net_address;
            }
            if addr.protocol == crate::protocol::Protocol::Ws && known_addr.timestamp >= addr.timestamp {
                tracing::debug!(identity = %addr.identity, "rejecting stale WS address update");
                return None;
            }
        }

        // 6. Creation (if needed), then RTC route merge.
        let is_new_record = known.is_none();
        if is_new_record {
            self.store.add(
                addr.identity,
                AddressRecord::new(addr.clone(), State::New, now, self.config.initial_failed_backoff_ms),
            );
        }
        if addr.protocol == crate::protocol::Protocol::Rtc {
            if let Some(ch) = channel {
                if let Some(record) = self.store.get_mut(&addr.identity) {
                    record.upsert_route(Route {
                        channel: ch,
                        distance: addr.distance,
                        timestamp: now,
                    });
                }
            }
        }

        let record = self.store.get_mut(&addr.identity)?;

        // 7. Connected lock: only a previously-missing net_address may be
        // filled in; nothing else about a live connection's address
        // changes underneath it.
        if record.state == State::Connected {
            if record.address.net_address.is_none() && addr.net_address.is_some() {
                record.address.net_address = addr.net_address;
            }
            return Some(AdmitOutcome::Updated(record.address.clone()));
        }

        // 8. Otherwise, replace the stored address with the merged
        // incoming one.
        record.address = addr.clone();
        if is_new_record {
            Some(AdmitOutcome::Created(addr))
        } else {
            Some(AdmitOutcome::Updated(addr))
        }
    }

    // ---- lifecycle events (spec.md §4.2 table) ------------------------

    /// A connection attempt to `address` has begun.
    pub fn connecting(&mut self, address: &PeerAddress, now: u64) {
        self.transition(address, Event::Connecting, now);
    }

    /// `address` just connected, optionally identified by `channel`.
    pub fn connected(&mut self, channel: Option<ChannelId>, address: PeerAddress, now: u64) {
        self.transition(&address, Event::Connected { channel }, now);
    }

    /// `address` disconnected over `channel` (if known).
    pub fn disconnected(
        &mut self,
        channel: Option<ChannelId>,
        address: &PeerAddress,
        closed_by_remote: bool,
        now: u64,
    ) {
        self.transition(
            address,
            Event::Disconnected {
                channel,
                by_remote: closed_by_remote,
            },
            now,
        );
    }

    /// A connection attempt to, or an established connection with,
    /// `address` failed.
    pub fn failure(&mut self, address: &PeerAddress, now: u64) {
        self.transition(address, Event::Failure, now);
    }

    /// `channel` reported `address` unreachable.
    pub fn unroutable(&mut self, channel: ChannelId, address: &PeerAddress, now: u64) {
        self.transition(address, Event::Unroutable { channel }, now);
    }

    /// Administratively ban `address` for `duration` ms (defaulting to
    /// `DEFAULT_BAN_TIME_MS`).
    pub fn ban(&mut self, address: &PeerAddress, duration: Option<u64>, now: u64) {
        self.transition(address, Event::Ban { duration }, now);
    }

    /// Dispatch `event` against the record for `address`'s identity,
    /// creating it first if the event's row in spec.md §4.2 allows that.
    /// This is the one place that state table is encoded; every public
    /// lifecycle method above only builds an [`Event`] and calls this.
    fn transition(&mut self, address: &PeerAddress, event: Event, now: u64) {
        let key = address.identity;
        match event {
            Event::Connecting => {
                if let Some(record) = self.store.get(&key) {
                    if matches!(record.state, State::New | State::Tried | State::Failed) {
                        self.store.set_state(&key, State::Connecting);
                    }
                }
            }
            Event::Connected { channel } => {
                if self.store.get(&key).is_none() {
                    let mut record = AddressRecord::new(
                        address.clone(),
                        State::Connected,
                        now,
                        self.config.initial_failed_backoff_ms,
                    );
                    if address.protocol == crate::protocol::Protocol::Rtc {
                        if let Some(ch) = channel {
                            record.upsert_route(Route {
                                channel: ch,
                                distance: address.distance,
                                timestamp: now,
                            });
                        }
                    }
                    self.store.add(key, record);
                    return;
                }
                let state = self.store.get(&key).map(|r| r.state);
                if state == Some(State::Banned) {
                    return;
                }
                self.store.set_state(&key, State::Connected);
                if let Some(record) = self.store.get_mut(&key) {
                    record.failed_attempts = 0;
                    record.last_seen = now;
                }
            }
            Event::Disconnected { channel, by_remote } => {
                if let Some(record) = self.store.get(&key) {
                    if record.state == State::Connected {
                        let is_dumb = record.address.protocol == crate::protocol::Protocol::Dumb;
                        if (by_remote && self.online.is_online()) || is_dumb {
                            self.remove_record(&key, now);
                        } else {
                            self.store.set_state(&key, State::Tried);
                        }
                    }
                }
                if let Some(ch) = channel {
                    self.revoke_routes_by_channel(ch, now);
                }
            }
            Event::Failure => {
                if let Some(record) = self.store.get(&key) {
                    if matches!(record.state, State::Connecting | State::Connected) {
                        let max = self.config.max_failed_attempts(record.address.protocol);
                        let record = self.store.get_mut(&key).unwrap();
                        record.failed_attempts += 1;
                        if record.failed_attempts >= max {
                            let backoff = record.ban_backoff;
                            record.banned_until = Some(now + backoff);
                            record.routes.clear();
                            record.escalate_backoff(self.config.max_failed_backoff_ms);
                            self.store.set_state(&key, State::Banned);
                            metrics::increment_counter!("peer_book_bans_total");
                        } else {
                            self.store.set_state(&key, State::Failed);
                        }
                    }
                }
            }
            Event::Unroutable { channel } => self.handle_unroutable(&key, channel, now),
            Event::Ban { duration } => {
                let until = now + duration.unwrap_or(self.config.default_ban_time_ms);
                if let Some(record) = self.store.get_mut(&key) {
                    record.banned_until = Some(until);
                    record.routes.clear();
                    self.store.set_state(&key, State::Banned);
                } else {
                    let mut record = AddressRecord::new(
                        address.clone(),
                        State::Banned,
                        now,
                        self.config.initial_failed_backoff_ms,
                    );
                    record.banned_until = Some(until);
                    self.store.add(key, record);
                }
                metrics::increment_counter!("peer_book_bans_total");
            }
        }
    }

    /// spec.md §4.2.2: an `unroutable` signal is only trusted on the
    /// peer's current best route.
    fn handle_unroutable(&mut self, key: &IdentityKey, channel: ChannelId, now: u64) {
        let record = match self.store.get(key) {
            Some(record) => record,
            None => return,
        };
        let best = match record.best_route() {
            Some(best) => *best,
            None => {
                tracing::debug!(%key, "dropping unroutable: record has no routes");
                return;
            }
        };
        if best.channel != channel {
            tracing::warn!(
                %key,
                reported = %channel,
                best_channel = %best.channel,
                "dropping unroutable on non-best channel"
            );
            return;
        }
        let now_empty = {
            let record = self.store.get_mut(key).unwrap();
            record.remove_route_by_channel(channel);
            record.routes.is_empty()
        };
        if now_empty {
            self.remove_record(key, now);
        }
    }

    /// spec.md §4.2.4: a disconnect on `channel` drops every RTC route
    /// through it, across every record, not just the disconnecting peer's
    /// own record (a shared signaling channel can carry routes to several
    /// peers).
    fn revoke_routes_by_channel(&mut self, channel: ChannelId, now: u64) {
        let mut emptied = Vec::new();
        for (key, record) in self.store.iter_mut() {
            if record.address.protocol == crate::protocol::Protocol::Rtc
                && record.remove_route_by_channel(channel)
                && record.routes.is_empty()
            {
                emptied.push(*key);
            }
        }
        for key in emptied {
            self.remove_record(&key, now);
        }
    }

    /// spec.md §4.2.3 `_remove`: seeds are banned, never deleted; anything
    /// already `Banned` is left alone (the ban is still in force); anyone
    /// else is dropped from the store outright.
    fn remove_record(&mut self, key: &IdentityKey, now: u64) {
        let (is_seed, state, backoff) = match self.store.get(key) {
            Some(record) => (record.address.is_seed(), record.state, record.ban_backoff),
            None => return,
        };
        if is_seed {
            let record = self.store.get_mut(key).unwrap();
            record.banned_until = Some(now + backoff);
            record.routes.clear();
            self.store.set_state(key, State::Banned);
            return;
        }
        if state == State::Banned {
            return;
        }
        self.store.remove(key);
    }

    // ---- housekeeping (spec.md §4.4) ----------------------------------

    /// One housekeeping pass: expire aged `New`/`Tried`/`Failed` records,
    /// lift or remove expired bans, and refresh `Connected` timestamps.
    /// Returns the addresses that were unbanned this pass, for the
    /// caller to fold into a separate `added` notification (spec.md §5).
    pub fn run_housekeeping(&mut self, now: u64) -> Vec<PeerAddress> {
        let mut to_remove = Vec::new();
        let mut to_unban = Vec::new();
        let mut to_delete_expired_ban = Vec::new();

        for (key, record) in self.store.iter_mut() {
            match record.state {
                State::New | State::Tried | State::Failed => {
                    if !record.address.is_seed()
                        && record
                            .address
                            .exceeds_age_threshold(now, self.config.max_age_ms(record.address.protocol))
                    {
                        to_remove.push(*key);
                    }
                }
                State::Banned => {
                    let banned_until = record.banned_until.unwrap_or(0);
                    if now >= banned_until {
                        let exhausted_budget =
                            record.failed_attempts >= self.config.max_failed_attempts(record.address.protocol);
                        if record.address.is_seed() || exhausted_budget {
                            record.state = State::New;
                            record.failed_attempts = 0;
                            record.banned_until = None;
                            to_unban.push(record.address.clone());
                        } else {
                            to_delete_expired_ban.push(*key);
                        }
                    }
                }
                State::Connected => {
                    record.address.timestamp = now;
                    if record.address.protocol == crate::protocol::Protocol::Rtc {
                        if let Some(best) = record.best_route().copied() {
                            record.remove_route_by_channel(best.channel);
                            record.upsert_route(Route {
                                timestamp: now,
                                ..best
                            });
                        }
                    }
                }
                // CONNECTING records have no timeout in this version; see
                // the TODO in housekeeper.rs for the open question this
                // leaves on the table.
                State::Connecting => {}
            }
        }

        for key in to_remove {
            self.store.remove(&key);
        }
        for key in to_delete_expired_ban {
            self.store.remove(&key);
        }

        if !to_unban.is_empty() {
            let _ = self.added_tx.send(to_unban.clone());
        }

        metrics::increment_counter!("peer_book_housekeeper_sweeps_total");
        metrics::gauge!("peer_book_store_size", self.store.len() as f64);
        metrics::gauge!("peer_book_connecting_count", self.store.connecting_count() as f64);

        to_unban
    }

    // ---- predicates (spec.md §6) ---------------------------------------

    /// True if `address` currently has a live connection.
    pub fn is_connected(&self, address: &PeerAddress) -> bool {
        self.store
            .get(&address.identity)
            .map(|record| record.state == State::Connected)
            .unwrap_or(false)
    }

    /// True if `address` is currently banned. Always `false` for seeds,
    /// even when they are internally in state `Banned` — a seed's ban
    /// only ever exists to keep it out of `query`/dialing, never to mark
    /// it untrusted (spec.md §6).
    pub fn is_banned(&self, address: &PeerAddress) -> bool {
        if address.is_seed() {
            return false;
        }
        self.store
            .get(&address.identity)
            .map(|record| record.state == State::Banned)
            .unwrap_or(false)
    }

    // ---- query (spec.md §4.3) ------------------------------------------

    /// Return up to `max_addresses` addresses eligible for dialing or
    /// gossip, scored per spec.md §4.3. `max_addresses` defaults to
    /// `config.default_max_query_addresses` when `None`.
    pub fn query(
        &mut self,
        protocol_mask: ProtocolMask,
        service_mask: Services,
        max_addresses: Option<usize>,
        now: u64,
    ) -> Vec<PeerAddress> {
        let max = max_addresses.unwrap_or(self.config.default_max_query_addresses);
        query::query(&mut self.store, protocol_mask, service_mask, max, &self.config, now)
    }
}

/// The outcome of admitting a single address through [`AddressBook::admit`].
enum AdmitOutcome {
    /// A brand-new record was created; include this address in the
    /// batch's `added` notification.
    Created(PeerAddress),
    /// An already-known, non-banned record was updated in place; this is
    /// not "genuinely new" in the sense spec.md §5 scopes the `added`
    /// notification to, so it is not broadcast.
    Updated(PeerAddress),
}
