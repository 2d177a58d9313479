//! Client-side query result cache.
//!
//! Memoizes "list images" responses for the four simple query shapes (all,
//! one category, one tag, date range) and patches or clears them when images
//! are updated, deleted or uploaded. State is written through to a
//! [`crate::storage::DurableStore`] on every mutation so it outlives the
//! process.

mod clock;
mod entry;
mod key;
mod query_cache;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use key::{date_range_key, CacheKey, Partition};
pub use query_cache::QueryResultCache;
pub use store::{CacheStats, CacheStore, ImageEntry};
