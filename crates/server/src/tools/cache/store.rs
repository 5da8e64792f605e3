//! cache_store tool implementation.
//!
//! Records new page content together with the summary generated for it.

use gistcache_core::{Metadata, Record, RecordStore};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_store tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoreParams {
    /// The resource URL.
    pub url: String,

    /// The page text the artifact was generated from.
    pub content: String,

    /// The generated artifact (e.g. the summary).
    pub artifact: String,

    /// Threshold to record alongside the entry (default: 0.8).
    #[serde(default)]
    pub threshold: Option<f64>,

    /// Extra fields merged into the record's metadata.
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Output from the cache_store tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoreOutput {
    /// The record as stored.
    pub record: Record,
}

/// Implementation of the cache_store tool.
pub async fn store_impl(store: &RecordStore, params: CacheStoreParams) -> Result<CallToolResult, McpError> {
    let record = store
        .store_content(&params.url, &params.content, params.artifact, params.threshold, params.metadata)
        .await?;

    json_result(&CacheStoreOutput { record })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{memory_store, parse_output};

    #[tokio::test]
    async fn test_store_impl() {
        let store = memory_store().await;
        let mut metadata = Metadata::new();
        metadata.insert("model".into(), "small".into());

        let params = CacheStoreParams {
            url: "HTTPS://Example.com/news//today".into(),
            content: "Today's news".into(),
            artifact: "A summary".into(),
            threshold: Some(0.9),
            metadata: Some(metadata),
        };

        let result = store_impl(&store, params).await.unwrap();
        let output: CacheStoreOutput = parse_output(&result);
        assert_eq!(output.record.key.as_str(), "example.com/news/today/");
        assert_eq!(output.record.access_count, 1);
        assert_eq!(output.record.metadata["model"], "small");
    }

    #[tokio::test]
    async fn test_store_impl_empty_artifact() {
        let store = memory_store().await;
        let params = CacheStoreParams {
            url: "example.com".into(),
            content: "text".into(),
            artifact: String::new(),
            threshold: None,
            metadata: None,
        };
        let err = store_impl(&store, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert!(store.get_latest("example.com").await.unwrap().is_none());
    }
}
