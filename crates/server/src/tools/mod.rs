//! MCP tool implementations.
//!
//! This module contains all tools exposed by the gist-cache server.

pub mod cache;
pub mod fingerprint;

use gistcache_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use gistcache_core::{MemoryKv, RecordStore, StoreOptions};
    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;

    pub async fn memory_store() -> RecordStore {
        RecordStore::open(Arc::new(MemoryKv::new()), StoreOptions::default())
            .await
            .unwrap()
    }

    /// Parse the JSON text payload of a tool result.
    pub fn parse_output<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
