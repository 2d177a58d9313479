//! Cache-aware gallery facade.
//!
//! [`CachedGallery`] is the composition root that owns a [`GalleryApi`]
//! implementation and a [`QueryResultCache`], and keeps the two consistent:
//! reads go through the cache, and every successful mutation invalidates it.
//!
//! | Operation        | Cache effect                        |
//! |------------------|-------------------------------------|
//! | `list_images`    | lookup, then fetch + store on miss  |
//! | `upload_image`   | `clear` (new image may match any view) |
//! | `delete_image`   | `remove_image`                      |
//! | `refresh_image`  | `update_image`                      |

mod builder;

pub use builder::{GalleryBuilder, StoreKind};

use crate::cache::{CacheStats, QueryResultCache};
use crate::models::{Image, ImageFilters, UploadRequest};
use crate::network::GalleryApi;
use crate::{GalleryError, Result};
use tracing::{debug, warn};

/// Where a listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSource {
    Cache,
    Network,
}

/// Result of [`CachedGallery::list_images`].
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub images: Vec<Image>,
    pub source: ListingSource,
}

impl Listing {
    pub fn is_cached(&self) -> bool {
        self.source == ListingSource::Cache
    }
}

/// Gallery API client fronted by a persistent query cache.
pub struct CachedGallery<A: GalleryApi> {
    api: A,
    cache: QueryResultCache,
}

impl<A: GalleryApi> CachedGallery<A> {
    pub fn new(api: A, cache: QueryResultCache) -> Self {
        Self { api, cache }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &QueryResultCache {
        &self.cache
    }

    /// List images, serving from cache when a fresh entry exists.
    ///
    /// A fetched result that cannot be persisted is still returned.
    pub async fn list_images(&self, filters: &ImageFilters) -> Result<Listing> {
        if let Some(images) = self.cache.lookup(filters) {
            return Ok(Listing {
                images,
                source: ListingSource::Cache,
            });
        }

        let images = self.fetch_and_store(filters).await?;
        Ok(Listing {
            images,
            source: ListingSource::Network,
        })
    }

    /// Fetch from the network regardless of cache state, then cache the result.
    pub async fn refresh_images(&self, filters: &ImageFilters) -> Result<Vec<Image>> {
        self.fetch_and_store(filters).await
    }

    /// Upload an image and drop every cached listing.
    pub async fn upload_image(&self, request: &UploadRequest) -> Result<Image> {
        let image = self.api.upload_image(request).await?;
        debug!("Uploaded image {}, clearing query cache", image.id);
        self.after_mutation("clear after upload", self.cache.clear());
        Ok(image)
    }

    /// Delete an image and remove it from every cached listing.
    ///
    /// If the API reports the image as already gone, it is still removed from
    /// the cache and `ImageNotFound` is returned.
    pub async fn delete_image(&self, id: &str) -> Result<()> {
        match self.api.delete_image(id).await {
            Ok(()) => {
                self.after_mutation("remove after delete", self.cache.remove_image(id));
                Ok(())
            }
            Err(GalleryError::ImageNotFound { id }) => {
                self.after_mutation("remove missing image", self.cache.remove_image(&id));
                Err(GalleryError::ImageNotFound { id })
            }
            Err(e) => Err(e),
        }
    }

    /// Re-read one image from the API and patch it into cached listings.
    ///
    /// An image the API no longer knows is removed from the cache before the
    /// `ImageNotFound` error is returned.
    pub async fn refresh_image(&self, id: &str) -> Result<Image> {
        match self.api.fetch_image(id).await {
            Ok(image) => {
                self.after_mutation("update after refresh", self.cache.update_image(&image));
                Ok(image)
            }
            Err(GalleryError::ImageNotFound { id }) => {
                self.after_mutation("remove missing image", self.cache.remove_image(&id));
                Err(GalleryError::ImageNotFound { id })
            }
            Err(e) => Err(e),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()
    }

    pub fn purge_expired(&self) -> Result<usize> {
        self.cache.purge_expired()
    }

    async fn fetch_and_store(&self, filters: &ImageFilters) -> Result<Vec<Image>> {
        let images = self.api.fetch_images(filters).await?;
        if let Err(e) = self.cache.store(filters, images.clone()) {
            warn!("Fetched {} images but could not cache them: {}", images.len(), e);
        }
        Ok(images)
    }

    // The remote mutation already succeeded; a cache persistence failure is
    // logged by the cache and must not turn the call into an error.
    fn after_mutation(&self, what: &str, result: Result<()>) {
        if let Err(e) = result {
            warn!("Cache {} failed: {}", what, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::config::CacheConfig;
    use crate::models::FilePayload;
    use crate::network::ImageFetcher;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn image(id: &str, title: &str, category: &str) -> Image {
        Image {
            id: id.into(),
            url: format!("https://storage.example/{}.jpg", id),
            title: title.into(),
            category: category.into(),
            tags: vec![],
            uploaded_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
            storage_path: None,
        }
    }

    /// In-memory stand-in for the REST API.
    #[derive(Default)]
    struct FakeApi {
        images: Mutex<Vec<Image>>,
        list_calls: AtomicUsize,
    }

    impl FakeApi {
        fn with_images(images: Vec<Image>) -> Self {
            Self {
                images: Mutex::new(images),
                list_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ImageFetcher for FakeApi {
        async fn fetch_images(&self, filters: &ImageFilters) -> Result<Vec<Image>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let images = self.images.lock().unwrap();
            Ok(images
                .iter()
                .filter(|i| filters.categories.is_empty() || filters.categories.contains(&i.category))
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl GalleryApi for FakeApi {
        async fn fetch_image(&self, id: &str) -> Result<Image> {
            self.images
                .lock()
                .unwrap()
                .iter()
                .find(|i| i.id == id)
                .cloned()
                .ok_or_else(|| GalleryError::ImageNotFound { id: id.to_string() })
        }

        async fn upload_image(&self, request: &UploadRequest) -> Result<Image> {
            let mut images = self.images.lock().unwrap();
            let created = image(&format!("new{}", images.len()), &request.title, &request.category);
            images.push(created.clone());
            Ok(created)
        }

        async fn delete_image(&self, id: &str) -> Result<()> {
            let mut images = self.images.lock().unwrap();
            let before = images.len();
            images.retain(|i| i.id != id);
            if images.len() == before {
                return Err(GalleryError::ImageNotFound { id: id.to_string() });
            }
            Ok(())
        }
    }

    fn gallery(images: Vec<Image>) -> (Arc<ManualClock>, CachedGallery<FakeApi>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = QueryResultCache::with_clock(MemoryStore::new(), CacheConfig::default(), clock.clone());
        (clock, CachedGallery::new(FakeApi::with_images(images), cache))
    }

    fn calls(gallery: &CachedGallery<FakeApi>) -> usize {
        gallery.api().list_calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_second_listing_is_served_from_cache() {
        let (_clock, gallery) = gallery(vec![image("a1", "one", "nature")]);

        let first = gallery.list_images(&ImageFilters::all()).await.unwrap();
        assert_eq!(first.source, ListingSource::Network);
        let second = gallery.list_images(&ImageFilters::all()).await.unwrap();
        assert!(second.is_cached());
        assert_eq!(first.images, second.images);
        assert_eq!(calls(&gallery), 1);
    }

    #[tokio::test]
    async fn test_expired_listing_is_refetched() {
        let (clock, gallery) = gallery(vec![image("a1", "one", "nature")]);

        gallery.list_images(&ImageFilters::all()).await.unwrap();
        clock.advance(Duration::from_secs(301));
        let listing = gallery.list_images(&ImageFilters::all()).await.unwrap();
        assert_eq!(listing.source, ListingSource::Network);
        assert_eq!(calls(&gallery), 2);
    }

    #[tokio::test]
    async fn test_combined_filters_always_hit_network() {
        let (_clock, gallery) = gallery(vec![image("a1", "one", "nature")]);
        let filters = ImageFilters::category("nature").with_category("city");

        gallery.list_images(&filters).await.unwrap();
        gallery.list_images(&filters).await.unwrap();
        assert_eq!(calls(&gallery), 2);
    }

    #[tokio::test]
    async fn test_upload_clears_cache() {
        let (_clock, gallery) = gallery(vec![image("a1", "one", "nature")]);
        gallery.list_images(&ImageFilters::all()).await.unwrap();

        let request = UploadRequest {
            title: "fresh".into(),
            category: "nature".into(),
            tags: vec![],
            file: FilePayload::from_bytes("f.png", "image/png", b"png"),
        };
        gallery.upload_image(&request).await.unwrap();
        assert_eq!(gallery.cache_stats().total_entries(), 0);

        let listing = gallery.list_images(&ImageFilters::all()).await.unwrap();
        assert_eq!(listing.source, ListingSource::Network);
        assert_eq!(listing.images.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_patches_cached_listings() {
        let (_clock, gallery) = gallery(vec![
            image("a1", "one", "nature"),
            image("b2", "two", "nature"),
        ]);
        gallery.list_images(&ImageFilters::all()).await.unwrap();
        gallery
            .list_images(&ImageFilters::category("nature"))
            .await
            .unwrap();

        gallery.delete_image("a1").await.unwrap();

        let all = gallery.list_images(&ImageFilters::all()).await.unwrap();
        assert!(all.is_cached());
        assert_eq!(all.images.len(), 1);
        assert_eq!(all.images[0].id, "b2");
        assert_eq!(calls(&gallery), 2);
    }

    #[tokio::test]
    async fn test_delete_of_unknown_id_leaves_other_records() {
        let (_clock, gallery) = gallery(vec![image("a1", "one", "nature")]);
        gallery.list_images(&ImageFilters::all()).await.unwrap();

        assert!(gallery.delete_image("zz").await.is_err());
        let all = gallery.list_images(&ImageFilters::all()).await.unwrap();
        assert_eq!(all.images.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_of_vanished_image_drops_cached_record() {
        let (_clock, gallery) = gallery(vec![
            image("a1", "one", "nature"),
            image("b2", "two", "nature"),
        ]);
        gallery.list_images(&ImageFilters::all()).await.unwrap();

        // Deleted elsewhere; the cached listing still has it
        gallery.api().images.lock().unwrap().retain(|i| i.id != "a1");

        assert!(matches!(
            gallery.delete_image("a1").await,
            Err(GalleryError::ImageNotFound { id }) if id == "a1"
        ));
        let all = gallery.list_images(&ImageFilters::all()).await.unwrap();
        assert!(all.is_cached());
        assert_eq!(all.images, vec![image("b2", "two", "nature")]);
    }

    #[tokio::test]
    async fn test_refresh_image_updates_and_removes() {
        let (_clock, gallery) = gallery(vec![image("a1", "one", "nature")]);
        gallery.list_images(&ImageFilters::all()).await.unwrap();

        gallery.api().images.lock().unwrap()[0].title = "renamed".into();
        let refreshed = gallery.refresh_image("a1").await.unwrap();
        assert_eq!(refreshed.title, "renamed");
        let cached = gallery.cache().lookup(&ImageFilters::all()).unwrap();
        assert_eq!(cached[0].title, "renamed");

        gallery.api().images.lock().unwrap().clear();
        assert!(matches!(
            gallery.refresh_image("a1").await,
            Err(GalleryError::ImageNotFound { .. })
        ));
        assert_eq!(gallery.cache().lookup(&ImageFilters::all()), Some(vec![]));
    }
}
