//! Seams between the cache layer and the gallery API.

use crate::models::{Image, ImageFilters, UploadRequest};
use crate::Result;
use async_trait::async_trait;

/// The network call the query cache wraps.
///
/// Called only after a cache miss; the cache itself never calls it.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_images(&self, filters: &ImageFilters) -> Result<Vec<Image>>;
}

/// Full gallery API surface: reads plus the mutations that invalidate cache.
#[async_trait]
pub trait GalleryApi: ImageFetcher {
    /// Fetch one image by id.
    async fn fetch_image(&self, id: &str) -> Result<Image>;

    /// Upload a new image and return the created record.
    async fn upload_image(&self, request: &UploadRequest) -> Result<Image>;

    /// Delete an image and its stored file.
    async fn delete_image(&self, id: &str) -> Result<()>;
}
