//! The indexed container of [`AddressRecord`]s.
//!
//! Uses `indexmap::IndexMap` rather than `std::collections::HashMap` for
//! the primary index, the way `zebra-network` itself depends on `indexmap`
//! for its own address bookkeeping: iteration order is then stable within
//! an uninterrupted traversal (spec requirement), which a plain `HashMap`
//! does not promise even when its contents are untouched.

use indexmap::IndexMap;

use crate::address::{IdentityKey, SignalId};
use crate::record::{AddressRecord, State};

/// The primary store: one [`AddressRecord`] per [`IdentityKey`], plus a
/// secondary index from `SignalId` to identity key for RTC lookups.
#[derive(Default)]
pub struct AddressStore {
    records: IndexMap<IdentityKey, AddressRecord>,
    by_signal_id: IndexMap<SignalId, IdentityKey>,
    connecting_count: usize,
}

impl AddressStore {
    /// An empty store.
    pub fn new() -> Self {
        AddressStore::default()
    }

    /// Look up a record by identity key.
    pub fn get(&self, key: &IdentityKey) -> Option<&AddressRecord> {
        self.records.get(key)
    }

    /// Look up a record by identity key, mutably.
    pub fn get_mut(&mut self, key: &IdentityKey) -> Option<&mut AddressRecord> {
        self.records.get_mut(key)
    }

    /// Look up an RTC record by its signaling identity.
    pub fn get_by_signal_id(&self, signal_id: &SignalId) -> Option<&AddressRecord> {
        let key = self.by_signal_id.get(signal_id)?;
        self.records.get(key)
    }

    /// Insert a brand-new record. Returns `false` (and does nothing) if a
    /// record already exists for this identity key — callers must check
    /// `get` first, the same contract `zebra-network`'s own address book
    /// collaborator places on its `contains_addr` callers.
    pub fn add(&mut self, key: IdentityKey, record: AddressRecord) -> bool {
        if self.records.contains_key(&key) {
            return false;
        }
        if let Some(signal_id) = record.address.signal_id {
            self.by_signal_id.insert(signal_id, key);
        }
        if record.state == State::Connecting {
            self.connecting_count += 1;
        }
        self.records.insert(key, record);
        true
    }

    /// Remove a record outright. Drops its signal-id index entry (if any)
    /// and decrements `connecting_count` if it was mid-connection.
    pub fn remove(&mut self, key: &IdentityKey) -> Option<AddressRecord> {
        let record = self.records.shift_remove(key)?;
        if let Some(signal_id) = record.address.signal_id {
            self.by_signal_id.remove(&signal_id);
        }
        if record.state == State::Connecting {
            self.connecting_count = self.connecting_count.saturating_sub(1);
        }
        Some(record)
    }

    /// Move a record to a new state, keeping `connecting_count` consistent
    /// regardless of what the new state is (this closes the audit note in
    /// spec.md §9: a record leaving `Connecting` always decrements the
    /// counter, even when it lands on `Banned` rather than being removed).
    pub fn set_state(&mut self, key: &IdentityKey, new_state: State) -> Option<State> {
        let record = self.records.get_mut(key)?;
        let old_state = record.state;
        if old_state == new_state {
            return Some(old_state);
        }
        if old_state == State::Connecting {
            self.connecting_count = self.connecting_count.saturating_sub(1);
        }
        if new_state == State::Connecting {
            self.connecting_count += 1;
        }
        record.state = new_state;
        Some(old_state)
    }

    /// Iterate over all records.
    pub fn values(&self) -> impl Iterator<Item = &AddressRecord> {
        self.records.values()
    }

    /// Iterate over all `(identity key, record)` pairs, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&IdentityKey, &mut AddressRecord)> {
        self.records.iter_mut()
    }

    /// The number of records currently in state `Connecting`.
    pub fn connecting_count(&self) -> usize {
        self.connecting_count
    }

    /// The total number of records in the store.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::PeerAddress;
    use crate::protocol::{Protocol, Services};

    fn key(byte: u8) -> IdentityKey {
        IdentityKey([byte; 32])
    }

    #[test]
    fn add_rejects_duplicate_identity() {
        let mut store = AddressStore::new();
        let addr = PeerAddress::new_gossiped(Protocol::Ws, key(1), None, 0, Services::NONE);
        let record = AddressRecord::new(addr.clone(), State::New, 0, 15_000);
        assert!(store.add(key(1), record.clone()));
        assert!(!store.add(key(1), record));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_drops_signal_id_index_and_connecting_count() {
        let mut store = AddressStore::new();
        let signal_id = SignalId(key(9));
        let addr = PeerAddress::new_rtc(key(1), signal_id, 0, None, 0, Services::NONE);
        let record = AddressRecord::new(addr, State::Connecting, 0, 15_000);
        store.add(key(1), record);
        assert_eq!(store.connecting_count(), 1);
        assert!(store.get_by_signal_id(&signal_id).is_some());

        store.remove(&key(1));
        assert_eq!(store.connecting_count(), 0);
        assert!(store.get_by_signal_id(&signal_id).is_none());
    }

    #[test]
    fn set_state_tracks_connecting_count_regardless_of_destination() {
        let mut store = AddressStore::new();
        let addr = PeerAddress::new_gossiped(Protocol::Ws, key(1), None, 0, Services::NONE);
        store.add(key(1), AddressRecord::new(addr, State::Connecting, 0, 15_000));
        assert_eq!(store.connecting_count(), 1);

        // Leaving `Connecting` for `Banned` (not just `Connected`) must
        // still release the slot.
        store.set_state(&key(1), State::Banned);
        assert_eq!(store.connecting_count(), 0);
    }
}
