//! gist-cache server entry point.
//!
//! Boots the MCP server on stdio transport over a SQLite-backed record store.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use gistcache_core::{AppConfig, RecordStore, SqliteKv, StoreOptions};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let kv = SqliteKv::open(&config.db_path).await?;
    let store = RecordStore::open(Arc::new(kv), StoreOptions::from(&config)).await?;

    tracing::info!(
        db_path = %config.db_path.display(),
        namespace = %config.namespace,
        max_records = config.max_records,
        "Starting gist-cache server on stdio transport"
    );

    let handler = handler::GistCacheServer::new(Arc::new(store));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
