//! The four-partition cache store and its serialized form.

use super::entry::CacheEntry;
use super::key::CacheKey;
use crate::models::Image;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cached result of one list query.
pub type ImageEntry = CacheEntry<Vec<Image>>;

/// All cached query results.
///
/// Maps are ordered so the serialized blob is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStore {
    /// Result of the unfiltered query.
    #[serde(default, rename = "allImages")]
    pub all: Option<ImageEntry>,
    /// Results keyed by category name.
    #[serde(default, rename = "categoryImages")]
    pub by_category: BTreeMap<String, ImageEntry>,
    /// Results keyed by tag.
    #[serde(default, rename = "tagImages")]
    pub by_tag: BTreeMap<String, ImageEntry>,
    /// Results keyed by `<start>_<end>`.
    #[serde(default, rename = "dateRangeImages")]
    pub by_date_range: BTreeMap<String, ImageEntry>,
}

/// Summary of what the cache currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// 1 if the unfiltered listing is cached, else 0.
    pub all_entries: usize,
    /// Entries keyed by a single category.
    pub category_entries: usize,
    /// Entries keyed by a single tag.
    pub tag_entries: usize,
    /// Entries keyed by a date range.
    pub date_range_entries: usize,
    /// Entries that a lookup would serve right now.
    pub fresh_entries: usize,
    /// Entries past their ttl but not yet purged.
    pub stale_entries: usize,
    /// Image records across all entries, duplicates counted per entry.
    pub cached_images: usize,
}

impl CacheStats {
    pub fn total_entries(&self) -> usize {
        self.all_entries + self.category_entries + self.tag_entries + self.date_range_entries
    }
}

impl CacheStore {
    pub fn is_empty(&self) -> bool {
        self.all.is_none()
            && self.by_category.is_empty()
            && self.by_tag.is_empty()
            && self.by_date_range.is_empty()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&ImageEntry> {
        match key {
            CacheKey::All => self.all.as_ref(),
            CacheKey::Category(c) => self.by_category.get(c),
            CacheKey::Tag(t) => self.by_tag.get(t),
            CacheKey::DateRange(r) => self.by_date_range.get(r),
        }
    }

    /// Insert or replace the entry at `key`.
    pub fn insert(&mut self, key: CacheKey, entry: ImageEntry) {
        match key {
            CacheKey::All => self.all = Some(entry),
            CacheKey::Category(c) => {
                self.by_category.insert(c, entry);
            }
            CacheKey::Tag(t) => {
                self.by_tag.insert(t, entry);
            }
            CacheKey::DateRange(r) => {
                self.by_date_range.insert(r, entry);
            }
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ImageEntry> {
        self.all
            .iter()
            .chain(self.by_category.values())
            .chain(self.by_tag.values())
            .chain(self.by_date_range.values())
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut ImageEntry> {
        self.all
            .iter_mut()
            .chain(self.by_category.values_mut())
            .chain(self.by_tag.values_mut())
            .chain(self.by_date_range.values_mut())
    }

    /// Replace every record whose id matches `image.id`, in place.
    ///
    /// Stale entries are patched too. Returns the number of records replaced.
    pub fn replace_image(&mut self, image: &Image) -> usize {
        let mut replaced = 0;
        for entry in self.entries_mut() {
            for slot in entry.data.iter_mut().filter(|img| img.id == image.id) {
                *slot = image.clone();
                replaced += 1;
            }
        }
        replaced
    }

    /// Drop every record with id `id`, keeping the order of the rest.
    ///
    /// Returns the number of records removed.
    pub fn remove_image(&mut self, id: &str) -> usize {
        let mut removed = 0;
        for entry in self.entries_mut() {
            let before = entry.data.len();
            entry.data.retain(|img| img.id != id);
            removed += before - entry.data.len();
        }
        removed
    }

    /// Drop entries that are stale at `now`. Returns how many were dropped.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let mut purged = 0;

        if self.all.as_ref().is_some_and(|e| !e.is_fresh_at(now)) {
            self.all = None;
            purged += 1;
        }

        for map in [
            &mut self.by_category,
            &mut self.by_tag,
            &mut self.by_date_range,
        ] {
            let before = map.len();
            map.retain(|_, entry| entry.is_fresh_at(now));
            purged += before - map.len();
        }

        purged
    }

    /// Drop entries whose ttl is zero. Such entries cannot be created through
    /// [`CacheEntry::new`] but can appear in a hand-edited or foreign blob.
    pub fn drop_zero_ttl(&mut self) -> usize {
        let mut dropped = 0;

        if self.all.as_ref().is_some_and(|e| e.ttl.is_zero()) {
            self.all = None;
            dropped += 1;
        }

        for map in [
            &mut self.by_category,
            &mut self.by_tag,
            &mut self.by_date_range,
        ] {
            let before = map.len();
            map.retain(|_, entry| !entry.ttl.is_zero());
            dropped += before - map.len();
        }

        dropped
    }

    pub fn stats(&self, now: DateTime<Utc>) -> CacheStats {
        let fresh_entries = self.entries().filter(|e| e.is_fresh_at(now)).count();
        let total = self.entries().count();

        CacheStats {
            all_entries: usize::from(self.all.is_some()),
            category_entries: self.by_category.len(),
            tag_entries: self.by_tag.len(),
            date_range_entries: self.by_date_range.len(),
            fresh_entries,
            stale_entries: total - fresh_entries,
            cached_images: self.entries().map(|e| e.data.len()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn image(id: &str, title: &str) -> Image {
        Image {
            id: id.into(),
            url: format!("https://storage.example/{}.jpg", id),
            title: title.into(),
            category: "nature".into(),
            tags: vec!["sky".into()],
            uploaded_at: t0(),
            storage_path: None,
        }
    }

    fn entry(images: Vec<Image>, ttl_secs: u64) -> ImageEntry {
        CacheEntry::new(images, t0(), Duration::from_secs(ttl_secs)).unwrap()
    }

    fn populated() -> CacheStore {
        let mut store = CacheStore::default();
        store.insert(
            CacheKey::All,
            entry(vec![image("a1", "one"), image("b2", "two"), image("c3", "three")], 300),
        );
        store.insert(
            CacheKey::Category("nature".into()),
            entry(vec![image("b2", "two"), image("a1", "one")], 300),
        );
        store.insert(CacheKey::Tag("city".into()), entry(vec![image("c3", "three")], 10));
        store
    }

    #[test]
    fn test_replace_image_in_every_partition() {
        let mut store = populated();
        let replaced = store.replace_image(&image("a1", "renamed"));
        assert_eq!(replaced, 2);

        let all = &store.get(&CacheKey::All).unwrap().data;
        assert_eq!(all[0].title, "renamed");
        assert_eq!(all[1].title, "two");
        assert_eq!(all.len(), 3);

        let nature = &store.get(&CacheKey::Category("nature".into())).unwrap().data;
        assert_eq!(nature[1].title, "renamed");
    }

    #[test]
    fn test_replace_absent_id_is_noop() {
        let mut store = populated();
        let before = store.clone();
        assert_eq!(store.replace_image(&image("zz", "ghost")), 0);
        assert_eq!(store, before);
    }

    #[test]
    fn test_remove_image_preserves_order() {
        let mut store = populated();
        assert_eq!(store.remove_image("b2"), 2);

        let all = &store.get(&CacheKey::All).unwrap().data;
        let ids: Vec<_> = all.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "c3"]);

        let before = store.clone();
        assert_eq!(store.remove_image("b2"), 0);
        assert_eq!(store, before);
    }

    #[test]
    fn test_drop_zero_ttl() {
        let mut store = populated();
        store.by_tag.get_mut("city").unwrap().ttl = Duration::ZERO;

        assert_eq!(store.drop_zero_ttl(), 1);
        assert!(store.get(&CacheKey::Tag("city".into())).is_none());
        assert!(store.get(&CacheKey::All).is_some());
        assert_eq!(store.drop_zero_ttl(), 0);
    }

    #[test]
    fn test_purge_expired_and_stats() {
        let mut store = populated();
        let later = t0() + chrono::Duration::seconds(60);

        let stats = store.stats(later);
        assert_eq!(stats.total_entries(), 3);
        assert_eq!(stats.fresh_entries, 2);
        assert_eq!(stats.stale_entries, 1);
        assert_eq!(stats.cached_images, 6);

        assert_eq!(store.purge_expired(later), 1);
        assert!(store.get(&CacheKey::Tag("city".into())).is_none());
        assert!(store.get(&CacheKey::All).is_some());
    }

    #[test]
    fn test_serialized_partition_names() {
        let json = serde_json::to_value(populated()).unwrap();
        assert!(json["allImages"].is_object());
        assert!(json["categoryImages"]["nature"].is_object());
        assert!(json["tagImages"]["city"].is_object());
        assert!(json["dateRangeImages"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_missing_partitions_default_to_empty() {
        let store: CacheStore = serde_json::from_str("{}").unwrap();
        assert!(store.is_empty());
    }
}
