//! Per-address state: [`AddressRecord`] and its [`State`] machine.
//!
//! Generalizes `zebra-network`'s four-state `PeerAddrState`
//! (`NeverAttempted` / `AttemptPending` / `Responded` / `Failed`) to the six
//! states the address book needs, and adds the RTC route bookkeeping a
//! single-transport `MetaAddr` never had to carry.

use crate::address::{PeerAddress, Route};
use crate::channel::ChannelId;
use crate::constants::{
    MAX_FAILED_ATTEMPTS_DUMB, MAX_FAILED_ATTEMPTS_RTC, MAX_FAILED_ATTEMPTS_WS,
};
use crate::protocol::Protocol;

/// The lifecycle state of an [`AddressRecord`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum State {
    /// Learned about, never attempted.
    New,
    /// A connection attempt is in flight.
    Connecting,
    /// Currently connected.
    Connected,
    /// Previously connected, now disconnected; a reconnection candidate.
    Tried,
    /// The last connection attempt failed.
    Failed,
    /// Administratively or self-banned; excluded from `query` until the
    /// housekeeper lifts the ban.
    Banned,
}

impl Default for State {
    fn default() -> Self {
        State::New
    }
}

/// The authoritative per-address entity the store indexes by identity key.
#[derive(Clone, Debug)]
pub struct AddressRecord {
    /// The current address value (updatable under the admission rules in
    /// `book::admit`).
    pub address: PeerAddress,
    /// The record's place in the connection lifecycle.
    pub state: State,
    /// RTC routes to this peer. Empty for WS/DUMB records.
    pub routes: Vec<Route>,
    /// Consecutive connection failures since the last success.
    pub failed_attempts: u32,
    /// When the current ban (if any) lifts. `None` means not banned; this
    /// is the Rust rendering of the source's `bannedUntil == -1` sentinel.
    pub banned_until: Option<u64>,
    /// The back-off applied the next time this record is banned; starts at
    /// `INITIAL_FAILED_BACKOFF_MS` and doubles (capped) per ban.
    pub ban_backoff: u64,
    /// When this record was first created.
    pub added_at: u64,
    /// When this record was last confirmed alive.
    pub last_seen: u64,
}

impl AddressRecord {
    /// Create a new record in `state`, with fresh counters.
    pub fn new(address: PeerAddress, state: State, now: u64, initial_backoff: u64) -> Self {
        AddressRecord {
            address,
            state,
            routes: Vec::new(),
            failed_attempts: 0,
            banned_until: None,
            ban_backoff: initial_backoff,
            added_at: now,
            last_seen: now,
        }
    }

    /// The failure budget for this record's protocol; dumb clients have a
    /// budget of zero, so a single failure bans them immediately.
    pub fn max_failed_attempts(&self) -> u32 {
        match self.address.protocol {
            Protocol::Ws => MAX_FAILED_ATTEMPTS_WS,
            Protocol::Rtc => MAX_FAILED_ATTEMPTS_RTC,
            Protocol::Dumb => MAX_FAILED_ATTEMPTS_DUMB,
        }
    }

    /// The route with the lowest distance, ties broken by the most recent
    /// timestamp, or `None` if this record has no routes (always true for
    /// non-RTC records).
    pub fn best_route(&self) -> Option<&Route> {
        self.routes.iter().fold(None, |best, route| match best {
            None => Some(route),
            Some(b) if route.is_better_than(b) => Some(route),
            Some(b) => Some(b),
        })
    }

    /// Insert a route, or refresh it in place if one through the same
    /// channel already exists.
    pub fn upsert_route(&mut self, route: Route) {
        if let Some(existing) = self.routes.iter_mut().find(|r| r.channel == route.channel) {
            *existing = route;
        } else {
            self.routes.push(route);
        }
    }

    /// Drop the route through `channel`, if any. Returns whether a route
    /// was removed.
    pub fn remove_route_by_channel(&mut self, channel: ChannelId) -> bool {
        let before = self.routes.len();
        self.routes.retain(|r| r.channel != channel);
        self.routes.len() != before
    }

    /// Double this record's ban back-off, capped at `max`, ready to be
    /// applied on the *next* ban.
    pub fn escalate_backoff(&mut self, max: u64) {
        self.ban_backoff = self.ban_backoff.saturating_mul(2).min(max);
    }
}
