//! Tunable configuration for the address book.
//!
//! `zebrad`'s own config types are plain `serde::Deserialize` structs even
//! though loading them from a file is `zebrad`'s job, not the library
//! crate's; `BookConfig` follows the same convention even though this
//! crate never reads a config file itself (that's the connection manager's
//! job — see spec.md §1, "Out of scope").

use serde::Deserialize;

use crate::protocol::Protocol;

use crate::constants::{
    DEFAULT_BAN_TIME_MS, DEFAULT_MAX_QUERY_ADDRESSES, HOUSEKEEPING_INTERVAL_MS,
    INITIAL_FAILED_BACKOFF_MS, MAX_AGE_DUMB_MS, MAX_AGE_RTC_MS, MAX_AGE_WS_MS, MAX_DISTANCE,
    MAX_FAILED_ATTEMPTS_DUMB, MAX_FAILED_ATTEMPTS_RTC, MAX_FAILED_ATTEMPTS_WS,
    MAX_FAILED_BACKOFF_MS, MAX_TIMESTAMP_DRIFT_MS,
};

/// Overridable tunables for [`crate::book::AddressBook`].
///
/// Every field defaults to the constant spec.md §6 names; a caller only
/// needs to set the fields it actually wants to change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// See [`crate::constants::MAX_AGE_WS_MS`].
    pub max_age_ws_ms: u64,
    /// See [`crate::constants::MAX_AGE_RTC_MS`].
    pub max_age_rtc_ms: u64,
    /// See [`crate::constants::MAX_AGE_DUMB_MS`].
    pub max_age_dumb_ms: u64,
    /// See [`crate::constants::MAX_DISTANCE`].
    pub max_distance: u8,
    /// See [`crate::constants::MAX_FAILED_ATTEMPTS_WS`].
    pub max_failed_attempts_ws: u32,
    /// See [`crate::constants::MAX_FAILED_ATTEMPTS_RTC`].
    pub max_failed_attempts_rtc: u32,
    /// See [`crate::constants::MAX_FAILED_ATTEMPTS_DUMB`].
    pub max_failed_attempts_dumb: u32,
    /// See [`crate::constants::MAX_TIMESTAMP_DRIFT_MS`].
    pub max_timestamp_drift_ms: u64,
    /// See [`crate::constants::HOUSEKEEPING_INTERVAL_MS`].
    pub housekeeping_interval_ms: u64,
    /// See [`crate::constants::DEFAULT_BAN_TIME_MS`].
    pub default_ban_time_ms: u64,
    /// See [`crate::constants::INITIAL_FAILED_BACKOFF_MS`].
    pub initial_failed_backoff_ms: u64,
    /// See [`crate::constants::MAX_FAILED_BACKOFF_MS`].
    pub max_failed_backoff_ms: u64,
    /// Default cap on the number of addresses a single `query` returns.
    pub default_max_query_addresses: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        BookConfig {
            max_age_ws_ms: MAX_AGE_WS_MS,
            max_age_rtc_ms: MAX_AGE_RTC_MS,
            max_age_dumb_ms: MAX_AGE_DUMB_MS,
            max_distance: MAX_DISTANCE,
            max_failed_attempts_ws: MAX_FAILED_ATTEMPTS_WS,
            max_failed_attempts_rtc: MAX_FAILED_ATTEMPTS_RTC,
            max_failed_attempts_dumb: MAX_FAILED_ATTEMPTS_DUMB,
            max_timestamp_drift_ms: MAX_TIMESTAMP_DRIFT_MS,
            housekeeping_interval_ms: HOUSEKEEPING_INTERVAL_MS,
            default_ban_time_ms: DEFAULT_BAN_TIME_MS,
            initial_failed_backoff_ms: INITIAL_FAILED_BACKOFF_MS,
            max_failed_backoff_ms: MAX_FAILED_BACKOFF_MS,
            default_max_query_addresses: DEFAULT_MAX_QUERY_ADDRESSES,
        }
    }
}

impl BookConfig {
    /// The configured max age for `protocol`, in milliseconds.
    pub fn max_age_ms(&self, protocol: Protocol) -> u64 {
        match protocol {
            Protocol::Ws => self.max_age_ws_ms,
            Protocol::Rtc => self.max_age_rtc_ms,
            Protocol::Dumb => self.max_age_dumb_ms,
        }
    }

    /// The configured failure budget for `protocol`.
    pub fn max_failed_attempts(&self, protocol: Protocol) -> u32 {
        match protocol {
            Protocol::Ws => self.max_failed_attempts_ws,
            Protocol::Rtc => self.max_failed_attempts_rtc,
            Protocol::Dumb => self.max_failed_attempts_dumb,
        }
    }
}
