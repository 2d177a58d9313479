//! Gallery Core - Headless client library for the image gallery.
//!
//! This crate provides the REST client for the gallery API and a persistent,
//! TTL-bounded cache of "list images" query results. It can be used
//! programmatically without the CLI.
//!
//! # Example
//!
//! ```rust,ignore
//! use gallery_core::{GalleryBuilder, ImageFilters, StoreKind};
//!
//! #[tokio::main]
//! async fn main() -> gallery_core::Result<()> {
//!     let gallery = GalleryBuilder::new()
//!         .store_kind(StoreKind::Sqlite)
//!         .cache_dir("/tmp/image-gallery")
//!         .build()?;
//!
//!     // First call goes to the network, the second is served from cache
//!     let listing = gallery.list_images(&ImageFilters::category("nature")).await?;
//!     println!("{} images ({:?})", listing.images.len(), listing.source);
//!
//!     // Deleting patches every cached listing
//!     gallery.delete_image(&listing.images[0].id).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gallery;
pub mod models;
pub mod network;
pub mod storage;

// Re-export commonly used types
pub use cache::{CacheKey, CacheStats, Clock, ManualClock, QueryResultCache, SystemClock};
pub use config::{CacheConfig, CacheSettings, ClientConfig, NetworkConfig, PathsConfig};
pub use error::{GalleryError, Result};
pub use gallery::{CachedGallery, GalleryBuilder, Listing, ListingSource, StoreKind};
pub use models::{FilePayload, Image, ImageFilters, UploadRequest};
pub use network::{GalleryApi, GalleryApiClient, ImageFetcher};
pub use storage::{DurableStore, JsonFileStore, MemoryStore, SqliteStore};
