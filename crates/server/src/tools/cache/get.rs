//! cache_get tool implementation.
//!
//! Retrieves the current record for a URL.

use gistcache_core::{Error, Record, RecordStore};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The resource URL.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    /// The cached record.
    pub record: Record,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(store: &RecordStore, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let record = store
        .get_latest(&params.url)
        .await?
        .ok_or_else(|| Error::NotFound(params.url.clone()))?;

    json_result(&CacheGetOutput { record })
}
