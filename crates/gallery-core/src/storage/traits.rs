//! Durable key-value store trait.

use crate::error::Result;

/// Persistent string-keyed blob store backing the query cache.
///
/// Blobs survive process restarts. All operations are synchronous: a
/// successful `save` means the blob is durable when the call returns.
pub trait DurableStore: Send + Sync {
    /// Load the blob stored under `key`.
    ///
    /// Returns `None` if nothing has been saved under the key.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`.
    fn save(&self, key: &str, blob: &str) -> Result<()>;

    /// Delete the blob stored under `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

impl<S: DurableStore + ?Sized> DurableStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, blob: &str) -> Result<()> {
        (**self).save(key, blob)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

impl<S: DurableStore + ?Sized> DurableStore for std::sync::Arc<S> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, blob: &str) -> Result<()> {
        (**self).save(key, blob)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
