//! cache_update_artifact tool implementation.
//!
//! Replaces the artifact for already-stored content, e.g. after a manual edit.

use gistcache_core::{Metadata, Record, RecordStore};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_update_artifact tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheUpdateParams {
    /// The resource URL; must have been stored before.
    pub url: String,

    /// The revised artifact.
    pub artifact: String,

    /// Extra fields merged into the record's metadata.
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Output from the cache_update_artifact tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheUpdateOutput {
    pub record: Record,
}

/// Implementation of the cache_update_artifact tool.
pub async fn update_impl(store: &RecordStore, params: CacheUpdateParams) -> Result<CallToolResult, McpError> {
    let record = store
        .update_artifact(&params.url, params.artifact, params.metadata)
        .await?;

    json_result(&CacheUpdateOutput { record })
}
