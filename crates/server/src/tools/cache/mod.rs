//! Cache-related MCP tools.
//!
//! Thin wrappers over the `RecordStore` operations.

pub mod check;
pub mod get;
pub mod stats;
pub mod store;
pub mod update;

pub use check::{CacheCheckParams, check_impl};
pub use get::{CacheGetParams, get_impl};
pub use stats::{clear_impl, stats_impl};
pub use store::{CacheStoreParams, store_impl};
pub use update::{CacheUpdateParams, update_impl};
