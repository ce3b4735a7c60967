//! Definitions of constants.
//!
//! These are the tunables named in the peer address book's external
//! interface; [`crate::config::BookConfig`] lets a caller override any of
//! them, but the defaults here are what the specification assumes.

/// The maximum age of a direct (WS) address before it is considered stale
/// and becomes ineligible for `query` or housekeeping retention.
pub const MAX_AGE_WS_MS: u64 = 30 * 60 * 1000;

/// The maximum age of an RTC (WebRTC, routed through signaling) address.
pub const MAX_AGE_RTC_MS: u64 = 10 * 60 * 1000;

/// The maximum age of a dumb (one-way) client address.
pub const MAX_AGE_DUMB_MS: u64 = 60 * 1000;

/// The maximum number of signaling hops an RTC address may travel before
/// it is rejected as a loop-prevention measure.
pub const MAX_DISTANCE: u8 = 4;

/// The number of connection failures a WS peer may accrue before it is
/// self-banned.
pub const MAX_FAILED_ATTEMPTS_WS: u32 = 3;

/// The number of connection failures an RTC peer may accrue before it is
/// self-banned.
pub const MAX_FAILED_ATTEMPTS_RTC: u32 = 2;

/// Dumb clients cannot accept inbound connections, so a single failure
/// self-bans them immediately.
pub const MAX_FAILED_ATTEMPTS_DUMB: u32 = 0;

/// The maximum amount an incoming address's timestamp may lie in the
/// future relative to our own clock before it is rejected.
pub const MAX_TIMESTAMP_DRIFT_MS: u64 = 10 * 60 * 1000;

/// How often the housekeeper sweeps the store.
pub const HOUSEKEEPING_INTERVAL_MS: u64 = 60_000;

/// The default duration of an administrative ban, used when `ban` is
/// called without an explicit duration.
pub const DEFAULT_BAN_TIME_MS: u64 = 600_000;

/// The starting back-off applied to a failure-induced (or seed-removal)
/// self-ban.
pub const INITIAL_FAILED_BACKOFF_MS: u64 = 15_000;

/// The back-off ceiling; doubling stops once it would exceed this value.
pub const MAX_FAILED_BACKOFF_MS: u64 = 600_000;

/// Default cap on the number of addresses returned by a single `query`.
pub const DEFAULT_MAX_QUERY_ADDRESSES: usize = 1000;
