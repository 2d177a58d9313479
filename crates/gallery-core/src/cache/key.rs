//! Cache key derivation.
//!
//! A query is classified into exactly one partition, first match wins:
//! 1. no filter at all -> `All`
//! 2. one category, nothing else -> `Category`
//! 3. one tag, nothing else -> `Tag`
//! 4. any date bound (other fields ignored) -> `DateRange`
//! 5. anything else -> not cacheable (forced miss)

use crate::config::CacheSettings;
use crate::models::{iso_millis, ImageFilters};
use chrono::{DateTime, Utc};
use std::fmt;

/// The four partitions of the cache store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    All,
    Category,
    Tag,
    DateRange,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::All => "all",
            Partition::Category => "category",
            Partition::Tag => "tag",
            Partition::DateRange => "date_range",
        }
    }
}

/// Partition plus key within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    All,
    Category(String),
    Tag(String),
    DateRange(String),
}

impl CacheKey {
    /// Derive the key for a query, or `None` for shapes that are never cached.
    pub fn for_filters(filters: &ImageFilters) -> Option<Self> {
        if filters.is_empty() {
            return Some(CacheKey::All);
        }

        let dated = filters.has_date_bound();

        if !dated && filters.tags.is_empty() {
            if let [category] = filters.categories.as_slice() {
                return Some(CacheKey::Category(category.clone()));
            }
        }

        if !dated && filters.categories.is_empty() {
            if let [tag] = filters.tags.as_slice() {
                return Some(CacheKey::Tag(tag.clone()));
            }
        }

        if dated {
            return Some(CacheKey::DateRange(date_range_key(
                filters.start_date.as_ref(),
                filters.end_date.as_ref(),
            )));
        }

        None
    }

    pub fn partition(&self) -> Partition {
        match self {
            CacheKey::All => Partition::All,
            CacheKey::Category(_) => Partition::Category,
            CacheKey::Tag(_) => Partition::Tag,
            CacheKey::DateRange(_) => Partition::DateRange,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::All => write!(f, "all"),
            CacheKey::Category(c) => write!(f, "category:{}", c),
            CacheKey::Tag(t) => write!(f, "tag:{}", t),
            CacheKey::DateRange(r) => write!(f, "date_range:{}", r),
        }
    }
}

/// Canonical `<start>_<end>` key; an absent bound is written as `null`.
pub fn date_range_key(start: Option<&DateTime<Utc>>, end: Option<&DateTime<Utc>>) -> String {
    let bound = |ts: Option<&DateTime<Utc>>| {
        ts.map(iso_millis)
            .unwrap_or_else(|| CacheSettings::DATE_SENTINEL.to_string())
    };
    format!("{}_{}", bound(start), bound(end))
}
