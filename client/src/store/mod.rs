//! Persistent local store - the authoritative copy.
//!
//! A thin serialization layer over a synchronous key-value backend. One
//! JSON-serialized array of domain records lives under each named key. The
//! local store is always the most recent source of truth for collection
//! membership; the remote database is a mirror, not authoritative.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::error::Result;
use satchel_engine::{Collection, SyncRecord};

/// Synchronous key-value backend behind the local store.
///
/// Implementations must be cheap to call from the UI thread: `get`/`set`
/// never suspend. Keys are collection names (`chats`, `quizzes`), values
/// the raw persisted JSON.
pub trait KeyValueBackend: Send + Sync + 'static {
    /// Fetch the raw value for `key`, or `None` if absent.
    fn get(&self, key: &str) -> std::io::Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> std::io::Result<()>;

    /// Remove `key` if present.
    fn remove(&self, key: &str) -> std::io::Result<()>;
}

/// Typed wrapper handling (de)serialization and timestamp revival.
#[derive(Debug)]
pub struct LocalStore<B> {
    backend: B,
}

impl<B: KeyValueBackend> LocalStore<B> {
    /// Wrap a backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Read the collection stored under `key`.
    ///
    /// An absent key, an unreadable backend, or a value that fails to parse
    /// all yield an empty collection; parse failures are logged, never
    /// thrown. Date-typed fields are revived per the records' serde
    /// annotations.
    pub fn read<R: SyncRecord>(&self, key: &str) -> Collection<R> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Collection::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "local store read failed, treating as empty");
                return Collection::new();
            }
        };

        match Collection::from_json(&raw) {
            Ok(collection) => collection,
            Err(e) => {
                tracing::warn!(key, error = %e, "stored collection failed to parse, treating as empty");
                Collection::new()
            }
        }
    }

    /// Serialize and store `collection` under `key` synchronously.
    ///
    /// Failures (quota, permissions) propagate to the facade, which catches
    /// and logs them; the caller's in-memory collection is the fallback
    /// source of truth for that operation.
    pub fn write<R: SyncRecord>(&self, key: &str, collection: &Collection<R>) -> Result<()> {
        let json = collection.to_json()?;
        self.write_raw(key, &json)
    }

    /// Store an already-serialized value under `key`.
    pub fn write_raw(&self, key: &str, json: &str) -> Result<()> {
        self.backend.set(key, json)?;
        Ok(())
    }

    /// Raw persisted value under `key`, if any. Used to snapshot the
    /// pre-image before a mutation.
    pub fn read_raw(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "local store read failed");
                None
            }
        }
    }

    /// Put a previously captured raw snapshot back. The recovery edge of
    /// delete reconciliation.
    pub fn restore_raw(&self, key: &str, snapshot: &str) -> Result<()> {
        self.backend.set(key, snapshot)?;
        Ok(())
    }
}
