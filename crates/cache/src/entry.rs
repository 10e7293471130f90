//! A single cached value with its write time and time-to-live

use chrono::{DateTime, Utc};
use filecache_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One key's stored value plus write timestamp and TTL
///
/// On disk an entry is `{"time": <unix seconds>, "expire": <seconds>, "data": "<json>"}`.
/// `data` holds the JSON text of the caller's value rather than the value itself,
/// so every entry has the same shape regardless of what was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unix timestamp (seconds) of the write
    #[serde(rename = "time")]
    pub stored_at: i64,
    /// Seconds after `stored_at` at which the entry expires; 0 never expires
    #[serde(rename = "expire")]
    pub ttl: u64,
    /// JSON encoding of the stored value
    pub data: String,
}

impl Entry {
    /// Encode `value` into a new entry
    pub fn encode<T>(key: &str, value: &T, stored_at: i64, ttl: u64) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_string(value).map_err(|e| Error::codec(key, e))?;
        Ok(Self {
            stored_at,
            ttl,
            data,
        })
    }

    /// Decode the stored value into `T`
    pub fn decode<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(&self.data).map_err(|e| Error::codec(key, e))
    }

    /// Whether the entry has outlived its TTL at `now`
    ///
    /// An entry expires only once strictly more than `ttl` seconds have passed,
    /// so an entry with a TTL of 10 written at t is still live at t + 10.
    pub fn is_expired_at(&self, now: i64) -> bool {
        if self.ttl == 0 {
            return false;
        }
        let age = i128::from(now) - i128::from(self.stored_at);
        age > i128::from(self.ttl)
    }

    /// Unix timestamp after which the entry counts as expired, if it ever does
    pub fn expires_at(&self) -> Option<i64> {
        if self.ttl == 0 {
            return None;
        }
        i64::try_from(self.ttl)
            .ok()
            .and_then(|ttl| self.stored_at.checked_add(ttl))
    }

    /// Write time as a UTC datetime
    pub fn stored_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.stored_at, 0)
    }
}

/// Whole seconds for a TTL duration
///
/// A non-zero duration below one second rounds up to one second; zero stays
/// zero and therefore means "never expires".
pub fn ttl_seconds(ttl: Duration) -> u64 {
    if ttl.is_zero() {
        0
    } else {
        ttl.as_secs().max(1)
    }
}
