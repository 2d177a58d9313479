//! Wiring for a [`CachedGallery`] backed by the HTTP client.

use super::CachedGallery;
use crate::cache::QueryResultCache;
use crate::config::{CacheConfig, ClientConfig, PathsConfig};
use crate::network::GalleryApiClient;
use crate::storage::{DurableStore, JsonFileStore, MemoryStore, SqliteStore};
use crate::{GalleryError, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Durable store backend for the query cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreKind {
    /// One JSON file per storage key.
    #[default]
    Json,
    /// Single SQLite key-value table.
    Sqlite,
    /// Process-local, nothing survives a restart.
    Memory,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Json => "json",
            StoreKind::Sqlite => "sqlite",
            StoreKind::Memory => "memory",
        }
    }

    /// Open a store of this kind rooted at `dir`.
    pub fn open(&self, dir: &Path) -> Result<Box<dyn DurableStore>> {
        let store: Box<dyn DurableStore> = match self {
            StoreKind::Json => Box::new(JsonFileStore::new(dir)),
            StoreKind::Sqlite => Box::new(SqliteStore::new(dir.join(PathsConfig::SQLITE_FILENAME))?),
            StoreKind::Memory => Box::new(MemoryStore::new()),
        };
        Ok(store)
    }
}

impl FromStr for StoreKind {
    type Err = GalleryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(StoreKind::Json),
            "sqlite" => Ok(StoreKind::Sqlite),
            "memory" => Ok(StoreKind::Memory),
            other => Err(GalleryError::validation(
                "store",
                format!("unknown store kind '{}' (expected json, sqlite or memory)", other),
            )),
        }
    }
}

/// Builder for a [`CachedGallery`] talking to the real API.
#[derive(Debug, Clone, Default)]
pub struct GalleryBuilder {
    client: ClientConfig,
    cache: CacheConfig,
    store_kind: StoreKind,
    cache_dir: Option<PathBuf>,
}

impl GalleryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_config(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    pub fn cache_config(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn store_kind(mut self, kind: StoreKind) -> Self {
        self.store_kind = kind;
        self
    }

    /// Directory holding the durable cache. Required unless the store is
    /// [`StoreKind::Memory`].
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<CachedGallery<GalleryApiClient>> {
        let store = match (&self.store_kind, &self.cache_dir) {
            (StoreKind::Memory, _) => StoreKind::Memory.open(Path::new(""))?,
            (kind, Some(dir)) => kind.open(dir)?,
            (kind, None) => {
                return Err(GalleryError::Config {
                    message: format!("{} cache store needs a cache directory", kind.as_str()),
                })
            }
        };

        info!(
            "Opening gallery client for {} with {} cache",
            self.client.base_url,
            store.backend_name()
        );
        let api = GalleryApiClient::new(self.client)?;
        let cache = QueryResultCache::with_config(store, self.cache);
        Ok(CachedGallery::new(api, cache))
    }
}
