//! Write-through query result cache.

use super::clock::{Clock, SystemClock};
use super::entry::CacheEntry;
use super::key::CacheKey;
use super::store::{CacheStats, CacheStore};
use crate::config::CacheConfig;
use crate::models::{Image, ImageFilters};
use crate::storage::DurableStore;
use crate::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Memoizes "list images" results per query shape for a bounded time.
///
/// Every operation holds one lock over the whole store for its full
/// duration, durable write included, so no caller can observe a partially
/// applied mutation. Mutations are written through to the [`DurableStore`]
/// before they return. If that write fails the in-memory state is kept and
/// the error is returned.
pub struct QueryResultCache {
    state: Mutex<CacheStore>,
    store: Box<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
}

impl QueryResultCache {
    /// Open a cache backed by `store`, loading any previously persisted state.
    pub fn new(store: impl DurableStore + 'static) -> Self {
        Self::with_config(store, CacheConfig::default())
    }

    /// Open a cache with custom configuration.
    pub fn with_config(store: impl DurableStore + 'static, config: CacheConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Open a cache that reads time from `clock`.
    pub fn with_clock(
        store: impl DurableStore + 'static,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = load_state(&store, &config.storage_key);
        Self {
            state: Mutex::new(state),
            store: Box::new(store),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cached images for `filters`, or `None` on a miss.
    ///
    /// Misses: uncacheable query shape, no entry, or a stale entry. A fresh
    /// entry holding an empty list is a hit. The returned list is a copy.
    pub fn lookup(&self, filters: &ImageFilters) -> Option<Vec<Image>> {
        let key = CacheKey::for_filters(filters)?;
        let state = self.lock_state();
        let now = self.clock.now();

        match state.get(&key) {
            Some(entry) if entry.is_fresh_at(now) => {
                debug!("Cache hit for {} ({} images)", key, entry.data.len());
                Some(entry.data.clone())
            }
            Some(_) => {
                debug!("Cache entry for {} is stale", key);
                None
            }
            None => {
                debug!("Cache miss for {}", key);
                None
            }
        }
    }

    /// Store `images` for `filters` with the configured default ttl.
    pub fn store(&self, filters: &ImageFilters, images: Vec<Image>) -> Result<()> {
        self.store_with_ttl(filters, images, self.config.default_ttl)
    }

    /// Store `images` for `filters`, overwriting any existing entry.
    ///
    /// Uncacheable query shapes are ignored. `ttl` must be at least 1ms.
    pub fn store_with_ttl(
        &self,
        filters: &ImageFilters,
        images: Vec<Image>,
        ttl: Duration,
    ) -> Result<()> {
        let Some(key) = CacheKey::for_filters(filters) else {
            debug!("Query shape not cacheable, skipping store");
            return Ok(());
        };

        let mut state = self.lock_state();
        let entry = CacheEntry::new(images, self.clock.now(), ttl)?;
        debug!("Caching {} images under {}", entry.data.len(), key);
        state.insert(key, entry);
        self.persist(&state)
    }

    /// Replace the cached copy of `image` (matched by id) in every entry.
    pub fn update_image(&self, image: &Image) -> Result<()> {
        let mut state = self.lock_state();
        let replaced = state.replace_image(image);
        debug!("Updated image {} in {} cached entries", image.id, replaced);
        self.persist(&state)
    }

    /// Remove image `id` from every entry.
    pub fn remove_image(&self, id: &str) -> Result<()> {
        let mut state = self.lock_state();
        let removed = state.remove_image(id);
        debug!("Removed image {} from {} cached entries", id, removed);
        self.persist(&state)
    }

    /// Drop everything, in memory and in durable storage.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock_state();
        *state = CacheStore::default();
        info!("Cleared query cache");

        self.store.remove(&self.config.storage_key).map_err(|e| {
            warn!(
                "Failed to clear persisted cache in {} store: {}",
                self.store.backend_name(),
                e
            );
            e
        })
    }

    /// Remove stale entries. Never runs implicitly; staleness is otherwise
    /// only evaluated on lookup.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut state = self.lock_state();
        let purged = state.purge_expired(self.clock.now());
        if purged == 0 {
            return Ok(0);
        }
        debug!("Purged {} stale cache entries", purged);
        self.persist(&state)?;
        Ok(purged)
    }

    pub fn stats(&self) -> CacheStats {
        self.lock_state().stats(self.clock.now())
    }

    /// Copy of the current in-memory store.
    pub fn snapshot(&self) -> CacheStore {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheStore> {
        // Mutations complete before any fallible step, so a poisoned store is
        // still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, state: &CacheStore) -> Result<()> {
        let blob = serde_json::to_string(state)?;
        self.store
            .save(&self.config.storage_key, &blob)
            .map_err(|e| {
                warn!(
                    "Failed to persist query cache to {} store, in-memory state kept: {}",
                    self.store.backend_name(),
                    e
                );
                e
            })
    }
}

/// Load the persisted store, falling back to empty on any failure.
fn load_state(store: &dyn DurableStore, key: &str) -> CacheStore {
    let blob = match store.load(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            debug!("No persisted cache under {}, starting empty", key);
            return CacheStore::default();
        }
        Err(e) => {
            warn!(
                "Failed to read persisted cache from {} store, starting empty: {}",
                store.backend_name(),
                e
            );
            return CacheStore::default();
        }
    };

    match serde_json::from_str::<CacheStore>(&blob) {
        Ok(mut state) => {
            let dropped = state.drop_zero_ttl();
            if dropped > 0 {
                warn!("Dropped {} persisted cache entries with zero ttl", dropped);
            }
            debug!("Loaded persisted cache ({} entries)", state.entries().count());
            state
        }
        Err(e) => {
            warn!("Persisted cache under {} is corrupt, starting empty: {}", key, e);
            CacheStore::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::{DateTime, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn image(id: &str, title: &str) -> Image {
        Image {
            id: id.into(),
            url: format!("https://storage.example/{}.jpg", id),
            title: title.into(),
            category: "nature".into(),
            tags: vec![],
            uploaded_at: t0(),
            storage_path: Some(format!("images/{}.jpg", id)),
        }
    }

    fn create_test_cache() -> (Arc<MemoryStore>, Arc<ManualClock>, QueryResultCache) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let cache = QueryResultCache::with_clock(store.clone(), CacheConfig::default(), clock.clone());
        (store, clock, cache)
    }

    #[test]
    fn test_fresh_then_stale() {
        let (_store, clock, cache) = create_test_cache();
        let filters = ImageFilters::category("nature");
        cache
            .store_with_ttl(&filters, vec![image("a1", "one")], Duration::from_secs(60))
            .unwrap();

        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.lookup(&filters).map(|v| v.len()), Some(1));

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.lookup(&filters), None);
    }

    #[test]
    fn test_empty_list_is_a_hit() {
        let (_store, _clock, cache) = create_test_cache();
        let filters = ImageFilters::tag("nothing-here");
        assert_eq!(cache.lookup(&filters), None);

        cache.store(&filters, vec![]).unwrap();
        assert_eq!(cache.lookup(&filters), Some(vec![]));
    }

    #[test]
    fn test_uncacheable_shape_is_never_stored() {
        let (store, _clock, cache) = create_test_cache();
        let filters = ImageFilters::category("x").with_category("y");

        cache.store(&filters, vec![image("a1", "one")]).unwrap();
        assert_eq!(cache.lookup(&filters), None);
        assert!(cache.snapshot().is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_single_vs_multi_category() {
        let (_store, _clock, cache) = create_test_cache();
        cache
            .store(&ImageFilters::category("x"), vec![image("a1", "one")])
            .unwrap();

        assert!(cache.lookup(&ImageFilters::category("x")).is_some());
        assert!(cache
            .lookup(&ImageFilters::category("x").with_category("y"))
            .is_none());
    }

    #[test]
    fn test_store_is_idempotent() {
        let (_store, _clock, cache) = create_test_cache();
        let filters = ImageFilters::all();
        let images = vec![image("a1", "one"), image("b2", "two")];

        cache.store(&filters, images.clone()).unwrap();
        let once = cache.snapshot();
        cache.store(&filters, images).unwrap();
        assert_eq!(cache.snapshot(), once);
    }

    #[test]
    fn test_zero_ttl_is_rejected_without_mutation() {
        let (store, _clock, cache) = create_test_cache();
        let result = cache.store_with_ttl(&ImageFilters::all(), vec![], Duration::ZERO);
        assert!(result.is_err());
        assert!(cache.snapshot().is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_every_mutation_writes_through() {
        let (store, _clock, cache) = create_test_cache();
        let filters = ImageFilters::all();

        cache.store(&filters, vec![image("a1", "one")]).unwrap();
        assert_eq!(store.save_count(), 1);
        cache.update_image(&image("a1", "uno")).unwrap();
        assert_eq!(store.save_count(), 2);
        cache.remove_image("a1").unwrap();
        assert_eq!(store.save_count(), 3);

        let blob = store.load(crate::config::CacheSettings::STORAGE_KEY).unwrap().unwrap();
        let persisted: CacheStore = serde_json::from_str(&blob).unwrap();
        assert_eq!(persisted, cache.snapshot());

        cache.clear().unwrap();
        assert!(store.load(crate::config::CacheSettings::STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let (store, _clock, cache) = create_test_cache();
        store.set_fail_writes(true);

        let err = cache
            .store(&ImageFilters::all(), vec![image("a1", "one")])
            .unwrap_err();
        assert!(err.is_storage());
        assert_eq!(cache.lookup(&ImageFilters::all()).map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_update_remove_failures_keep_memory_state() {
        let (store, _clock, cache) = create_test_cache();
        let all = ImageFilters::all();
        cache
            .store(&all, vec![image("a1", "one"), image("b2", "two")])
            .unwrap();
        store.set_fail_writes(true);

        assert!(cache.update_image(&image("a1", "uno")).unwrap_err().is_storage());
        assert_eq!(cache.lookup(&all).unwrap()[0].title, "uno");

        assert!(cache.remove_image("b2").unwrap_err().is_storage());
        assert_eq!(cache.lookup(&all), Some(vec![image("a1", "uno")]));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_clear_failure_still_empties_memory() {
        let (store, _clock, cache) = create_test_cache();
        cache.store(&ImageFilters::tag("sky"), vec![image("a1", "one")]).unwrap();
        store.set_fail_writes(true);

        assert!(cache.clear().unwrap_err().is_storage());
        assert!(cache.snapshot().is_empty());
        assert_eq!(cache.lookup(&ImageFilters::tag("sky")), None);
        assert!(store.load(crate::config::CacheSettings::STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn test_zero_ttl_blob_entry_is_dropped_on_load() {
        let blob = r#"{
            "allImages": {"data": [], "storedAt": "2000-01-01T00:00:00Z", "ttlMs": 0},
            "tagImages": {"sky": {"data": [], "storedAt": "2000-01-01T00:00:00Z", "ttlMs": 1000}}
        }"#;
        let store = MemoryStore::with_blob(crate::config::CacheSettings::STORAGE_KEY, blob);
        let cache = QueryResultCache::new(store);

        let snapshot = cache.snapshot();
        assert!(snapshot.all.is_none());
        assert_eq!(snapshot.by_tag["sky"].ttl, Duration::from_secs(1));
    }

    #[test]
    fn test_corrupt_blob_loads_empty() {
        let store = MemoryStore::with_blob(crate::config::CacheSettings::STORAGE_KEY, "{not json");
        let cache = QueryResultCache::new(store);
        assert!(cache.snapshot().is_empty());
        assert_eq!(cache.lookup(&ImageFilters::all()), None);
    }

    #[test]
    fn test_purge_expired_persists() {
        let (store, clock, cache) = create_test_cache();
        cache
            .store_with_ttl(&ImageFilters::tag("a"), vec![], Duration::from_secs(1))
            .unwrap();
        cache
            .store_with_ttl(&ImageFilters::tag("b"), vec![], Duration::from_secs(100))
            .unwrap();

        clock.advance(Duration::from_secs(5));
        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(store.save_count(), 3);
        assert_eq!(cache.purge_expired().unwrap(), 0);
        assert_eq!(store.save_count(), 3);
        assert_eq!(cache.stats().tag_entries, 1);
    }
}
