//! Cache entry envelope stored in the key-value store
//!
//! Every cached payload is wrapped as `{"data": ..., "expiry": <ms>}` so that
//! freshness can be evaluated at read time. The store itself knows nothing
//! about expiry.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Upper bound on a freshness window (one year)
const MAX_WINDOW_MINS: u64 = 365 * 24 * 60;

/// Wrapper for a cached payload with its absolute expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub data: T,
    /// Expiry in milliseconds since the Unix epoch
    pub expiry: i64,
}

impl<T> CacheEntry<T> {
    /// Creates an entry that stays fresh for `freshness_mins` minutes after `now`
    pub fn new(data: T, now: DateTime<Utc>, freshness_mins: u64) -> Self {
        let window = Duration::minutes(freshness_mins.min(MAX_WINDOW_MINS) as i64);
        let expiry = now
            .checked_add_signed(window)
            .map(|t| t.timestamp_millis())
            .unwrap_or(i64::MAX);
        Self { data, expiry }
    }

    /// Returns true while `now` is strictly before the expiry
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() < self.expiry
    }
}

impl<T: Serialize> CacheEntry<T> {
    /// Serializes the envelope to its stored text form
    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<T: DeserializeOwned> CacheEntry<T> {
    /// Parses a stored envelope
    pub fn from_text(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
