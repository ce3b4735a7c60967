//! Error types for the peer address book.
//!
//! Everything inside a state transition is best-effort and never raises to
//! the caller (see spec.md §7, "Never fatal"); the only genuinely fallible,
//! caller-visible operation is constructing the book itself from a
//! configuration that doesn't make sense.

use thiserror::Error;

/// Errors returned by [`crate::book::AddressBook::new`].
#[derive(Error, Debug, Eq, PartialEq)]
pub enum BookError {
    /// `initial_failed_backoff_ms` exceeds `max_failed_backoff_ms`, so the
    /// very first self-ban would already be clamped — almost certainly a
    /// configuration mistake rather than an intentional aggressive ban.
    #[error("initial_failed_backoff_ms ({initial}) exceeds max_failed_backoff_ms ({max})")]
    InvalidBackoffConfig {
        /// The configured initial back-off.
        initial: u64,
        /// The configured back-off ceiling.
        max: u64,
    },
}
