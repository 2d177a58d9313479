//! Centralized configuration for the gallery client.
//!
//! Compile-time constants live on unit structs; runtime-tunable settings are
//! in [`CacheConfig`] and [`ClientConfig`].

use std::time::Duration;

/// Query cache constants.
pub struct CacheSettings;

impl CacheSettings {
    /// How long a stored query result stays fresh unless a ttl is given.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
    /// Key under which the whole cache store is persisted.
    pub const STORAGE_KEY: &'static str = "image_gallery_cache";
    /// Token written in place of an absent date bound.
    pub const DATE_SENTINEL: &'static str = "null";
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const DEFAULT_API_URL: &'static str =
        "https://us-central1-galeria-b7e1d.cloudfunctions.net/api";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);
    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
    pub const USER_AGENT: &'static str = "Gallery-Client/1.0";
}

/// Shared directory and file names.
pub struct PathsConfig;

impl PathsConfig {
    pub const CACHE_DIR_NAME: &'static str = "image-gallery";
    pub const SQLITE_FILENAME: &'static str = "cache.sqlite";
}

/// Per-instance cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied by `store` when the caller does not pass one.
    pub default_ttl: Duration,
    /// Durable-store key holding the serialized cache.
    pub storage_key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: CacheSettings::DEFAULT_TTL,
            storage_key: CacheSettings::STORAGE_KEY.to_string(),
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the gallery API, without the `/images` suffix.
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: NetworkConfig::DEFAULT_API_URL.to_string(),
            timeout: NetworkConfig::REQUEST_TIMEOUT,
            max_retries: NetworkConfig::MAX_RETRIES,
        }
    }
}
