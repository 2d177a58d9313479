//! JSON-file durable store: one file per key.

use super::atomic::{atomic_read_text, atomic_write_text, remove_if_exists};
use super::traits::DurableStore;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores each key as `<dir>/<key>.json`, written atomically.
pub struct JsonFileStore {
    dir: PathBuf,
    keep_backup: bool,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            keep_backup: false,
        }
    }

    /// Keep a `.bak` copy of the previous blob on every save.
    pub fn with_backup(mut self, keep_backup: bool) -> Self {
        self.keep_backup = keep_backup;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Path separators in the key are flattened.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe_key = key.replace(['/', '\\', ':'], "-");
        self.dir.join(format!("{}.json", safe_key))
    }
}

impl DurableStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        debug!("Loading {} from {}", key, path.display());
        atomic_read_text(&path)
    }

    fn save(&self, key: &str, blob: &str) -> Result<()> {
        atomic_write_text(&self.path_for(key), blob, self.keep_backup)
    }

    fn remove(&self, key: &str) -> Result<()> {
        remove_if_exists(&self.path_for(key))
    }

    fn backend_name(&self) -> &'static str {
        "json-file"
    }
}
