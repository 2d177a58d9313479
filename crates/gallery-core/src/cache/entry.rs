//! Time-stamped cache entries.

use crate::{GalleryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached value with the time it was stored and how long it stays fresh.
///
/// `ttl` is kept at millisecond granularity so the in-memory entry and its
/// serialized form are identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub data: T,
    pub stored_at: DateTime<Utc>,
    #[serde(rename = "ttlMs", with = "duration_millis")]
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// Create an entry; `ttl` must be at least one millisecond.
    pub fn new(data: T, stored_at: DateTime<Utc>, ttl: Duration) -> Result<Self> {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        if millis == 0 {
            return Err(GalleryError::validation(
                "ttl",
                format!("must be at least 1ms, got {:?}", ttl),
            ));
        }
        Ok(Self {
            data,
            stored_at,
            ttl: Duration::from_millis(millis),
        })
    }

    /// Fresh iff `now - stored_at <= ttl`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.stored_at);
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => age <= ttl,
            Err(_) => true,
        }
    }

    /// When the entry stops being fresh.
    pub fn expires_at(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.stored_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
