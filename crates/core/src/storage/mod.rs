//! Durable key/value collaborators for the record store.
//!
//! The store serializes its own history and only needs `get`/`put` of opaque
//! bytes with read-your-writes consistency. Two backends ship here:
//!
//! - [`MemoryKv`] for tests and throwaway caches
//! - [`SqliteKv`] backed by SQLite in WAL mode via tokio-rusqlite

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;

pub mod migrations;
pub mod sqlite;

pub use sqlite::SqliteKv;

/// Byte-oriented key/value storage.
///
/// Timeouts and retries are the implementation's business; the record store
/// surfaces any error as-is.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;

    /// Replace the value stored under `key`.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Error>;
}

/// In-process storage with no durability.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Error> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
