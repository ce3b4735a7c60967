//! The tagged event variant lifecycle transitions dispatch on.
//!
//! The address book this crate is modeled on originally dispatched by
//! *method name* — whichever lifecycle method the caller invoked drove the
//! transition. That's unsound in a systems language (there's no reflection
//! to recover "which method called me" safely, and it hides the transition
//! table in scattered call sites). Instead, every lifecycle method on
//! [`crate::book::AddressBook`] builds one of these and hands it to a
//! single `transition` function, which is the only place the state table
//! in spec.md §4.2 is encoded.
//!
//! `add` is deliberately not a variant here: its seven-step admission
//! algorithm (§4.2.1) is its own pipeline, not a small state transition,
//! and it can create or update several records from one call.

use crate::channel::ChannelId;

/// A single lifecycle event applied to one address record.
#[derive(Debug, Clone, Copy)]
pub enum Event {
    /// A connection attempt to this address has begun.
    Connecting,
    /// The connection succeeded, optionally over a known channel.
    Connected {
        /// The channel the connection was established on, if any (absent
        /// for a bare `connected` notification with no live channel yet).
        channel: Option<ChannelId>,
    },
    /// The connection ended.
    Disconnected {
        /// The channel that disconnected, if known. Also used to revoke
        /// any RTC routes that went through it (§4.2.4).
        channel: Option<ChannelId>,
        /// Whether the remote end closed the connection.
        by_remote: bool,
    },
    /// The connection attempt or an established connection failed.
    Failure,
    /// A signaling channel reported this peer unreachable.
    Unroutable {
        /// The channel that reported the peer unroutable.
        channel: ChannelId,
    },
    /// Administratively ban this address.
    Ban {
        /// The ban duration; `None` uses `DEFAULT_BAN_TIME_MS`.
        duration: Option<u64>,
    },
}
