//! Core of gist-cache, a fuzzy content cache for generated summaries.
//!
//! This crate provides:
//! - Locality-sensitive text fingerprints
//! - Resource identifier normalization into cache keys
//! - A similarity-gated, capacity-bounded record store
//! - Key/value storage backends (in-memory and SQLite)
//! - Unified error types and layered configuration

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod key;
pub mod storage;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use fingerprint::{ChangeLevel, Fingerprint};
pub use key::CacheKey;
pub use storage::{KvStore, MemoryKv, SqliteKv};
pub use store::{CacheCheck, CacheStats, Metadata, Record, RecordStore, Resolved, StoreOptions};
