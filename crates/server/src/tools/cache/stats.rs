//! cache_stats and cache_clear tool implementations.

use gistcache_core::RecordStore;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    /// Number of records dropped.
    pub cleared: usize,
}

/// Implementation of the cache_stats tool.
pub async fn stats_impl(store: &RecordStore) -> Result<CallToolResult, McpError> {
    json_result(&store.stats().await)
}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(store: &RecordStore) -> Result<CallToolResult, McpError> {
    let cleared = store.clear_all().await?;
    json_result(&CacheClearOutput { cleared })
}
