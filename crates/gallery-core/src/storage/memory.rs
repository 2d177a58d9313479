//! In-process durable store, for tests and ephemeral sessions.

use super::traits::DurableStore;
use crate::error::{GalleryError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// HashMap-backed store. Nothing outlives the value itself.
///
/// `set_fail_writes(true)` makes every `save`/`remove` fail, which lets
/// callers exercise the write-failure path of the cache.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob directly, bypassing the failure switch.
    pub fn with_blob(key: &str, blob: &str) -> Self {
        let store = Self::new();
        store
            .blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), blob.to_string());
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GalleryError::Io {
                message: format!("Write to {} rejected: store is read-only", key),
                path: None,
                source: Some(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "memory store write failure",
                )),
            });
        }
        Ok(())
    }
}

impl DurableStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> Result<()> {
        self.check_writable(key)?;
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.insert(key.to_string(), blob.to_string());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
