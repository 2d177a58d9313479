//! Durable key-value stores.
//!
//! The query cache persists itself as a single serialized blob through the
//! [`DurableStore`] trait. Backends:
//! - [`JsonFileStore`]: one atomically-written file per key
//! - [`SqliteStore`]: a key-value table in SQLite
//! - [`MemoryStore`]: in-process map for tests and throwaway sessions

mod atomic;
mod file;
mod memory;
mod sqlite;
mod traits;

pub use atomic::{atomic_read_text, atomic_write_text};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::DurableStore;
