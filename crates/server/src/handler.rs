//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use gistcache_core::RecordStore;

use crate::tools::{
    cache::{
        CacheCheckParams, CacheGetParams, CacheStoreParams, CacheUpdateParams, check_impl, clear_impl, get_impl,
        stats_impl, store_impl, update_impl,
    },
    fingerprint::{FingerprintParams, fingerprint_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for gist-cache.
#[derive(Clone)]
pub struct GistCacheServer {
    store: Arc<RecordStore>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl GistCacheServer {
    /// Create a new server handler around a shared record store.
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store, tool_router: Self::tool_router() }
    }

    #[tool(description = "Check whether page content is similar enough to the cached version of a URL to reuse its summary.")]
    async fn cache_check(&self, params: Parameters<CacheCheckParams>) -> Result<CallToolResult, McpError> {
        check_impl(&self.store, params.0).await
    }

    #[tool(description = "Store page content and the summary generated from it for a URL.")]
    async fn cache_store(&self, params: Parameters<CacheStoreParams>) -> Result<CallToolResult, McpError> {
        store_impl(&self.store, params.0).await
    }

    #[tool(description = "Replace the cached summary for a URL without changing its content fingerprint.")]
    async fn cache_update_artifact(&self, params: Parameters<CacheUpdateParams>) -> Result<CallToolResult, McpError> {
        update_impl(&self.store, params.0).await
    }

    #[tool(description = "Get the cached record for a URL.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.store, params.0).await
    }

    #[tool(description = "Report cache-wide counters: total accesses, unique keys, recent activity.")]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        stats_impl(&self.store).await
    }

    #[tool(description = "Drop every cached record. Irreversible.")]
    async fn cache_clear(&self) -> Result<CallToolResult, McpError> {
        clear_impl(&self.store).await
    }

    #[tool(description = "Compute the 64-bit similarity fingerprint of text, optionally comparing it to another text or fingerprint.")]
    async fn fingerprint(&self, params: Parameters<FingerprintParams>) -> Result<CallToolResult, McpError> {
        fingerprint_impl(params.0).await
    }
}

impl ServerHandler for GistCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "gist-cache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::memory_store;

    #[tokio::test]
    async fn test_all_tools_registered() {
        let server = GistCacheServer::new(Arc::new(memory_store().await));
        let names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();

        for expected in [
            "cache_check",
            "cache_store",
            "cache_update_artifact",
            "cache_get",
            "cache_stats",
            "cache_clear",
            "fingerprint",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing tool {expected}");
        }
    }
}
