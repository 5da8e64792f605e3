//! cache_check tool implementation.
//!
//! Decides whether fresh page content can reuse the cached summary.

use gistcache_core::RecordStore;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_check tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheCheckParams {
    /// The resource URL, in any common spelling.
    pub url: String,

    /// The freshly fetched page text.
    pub content: String,

    /// Minimum similarity in [0, 1] for a hit (default: 0.8).
    #[serde(default)]
    pub threshold: Option<f64>,
}

/// Implementation of the cache_check tool.
pub async fn check_impl(store: &RecordStore, params: CacheCheckParams) -> Result<CallToolResult, McpError> {
    let check = store
        .check_cache(&params.url, &params.content, params.threshold)
        .await?;
    json_result(&check)
}
