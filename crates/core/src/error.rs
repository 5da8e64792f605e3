//! Unified error types for gist-cache.
//!
//! Every variant renders with a stable upper-case code prefix so callers on
//! the other side of the MCP boundary can match on it.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the fuzzy content cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller-correctable input problem (empty identifier, threshold out of range, bad hex).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// `update_artifact` was called for a key that has never been stored.
    #[error("NOT_FOUND: no record for {0}")]
    NotFound(String),

    /// The key/value collaborator failed, or returned bytes that could not be decoded.
    #[error("STORAGE_FAILURE: {operation} failed for {key}: {message}")]
    StorageFailure { operation: &'static str, key: String, message: String },

    /// SQLite operation failed.
    #[error("STORAGE_FAILURE: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORAGE_FAILURE: migration failed: {0}")]
    MigrationFailed(String),

    /// The artifact generator handed to `RecordStore::resolve` failed.
    #[error("GENERATION_FAILED: {0}")]
    Generation(String),
}

impl Error {
    /// Wrap a collaborator error with the failing operation and key.
    pub fn storage(operation: &'static str, key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Error::StorageFailure { operation, key: key.into(), message: err.to_string() }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::NotFound(key) => (-32001, format!("no record for {key}")),
            Error::StorageFailure { .. } => (-32002, err.to_string()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Generation(msg) => (-32003, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("example.com/".to_string());
        assert!(err.to_string().contains("NOT_FOUND"));
        assert!(err.to_string().contains("example.com/"));
    }

    #[test]
    fn test_storage_error_names_operation_and_key() {
        let err = Error::storage("put", "gist:history", "disk full");
        let text = err.to_string();
        assert!(text.starts_with("STORAGE_FAILURE"));
        assert!(text.contains("put"));
        assert!(text.contains("gist:history"));
        assert!(text.contains("disk full"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::NotFound("example.com/".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32001);

        let err = Error::InvalidInput("empty id".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }
}
