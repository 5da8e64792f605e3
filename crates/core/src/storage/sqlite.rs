//! SQLite key/value backend.
//!
//! Opens the database, applies WAL and related pragmas, runs migrations and
//! serves `get`/`put` against a single `kv` table.

use std::path::Path;

use async_trait::async_trait;
use tokio_rusqlite::{Connection, params, rusqlite};

use super::{KvStore, migrations};
use crate::Error;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// SQLite-backed key/value store.
///
/// Wraps a tokio-rusqlite Connection that runs statements on a background
/// thread. Cloning shares the connection.
#[derive(Clone, Debug)]
pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    /// Open a database at the specified path, creating it if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl KvStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Vec<u8>>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;

                match stmt.query_row(params![key], |row| row.get(0)) {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Error> {
        let key = key.to_string();
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at",
                    params![key, value, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let kv = SqliteKv::open_in_memory().await.unwrap();
        let version = kv
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let kv = SqliteKv::open_in_memory().await.unwrap();
        kv.put("gist:history", br#"{"records":{}}"#.to_vec()).await.unwrap();

        let value = kv.get("gist:history").await.unwrap().unwrap();
        assert_eq!(value, br#"{"records":{}}"#.to_vec());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let kv = SqliteKv::open_in_memory().await.unwrap();
        assert!(kv.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let kv = SqliteKv::open_in_memory().await.unwrap();
        kv.put("k", b"old".to_vec()).await.unwrap();
        kv.put("k", b"new".to_vec()).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().unwrap(), b"new".to_vec());
    }

    #[tokio::test]
    async fn test_clones_share_connection() {
        let kv = SqliteKv::open_in_memory().await.unwrap();
        let other = kv.clone();
        kv.put("k", b"v".to_vec()).await.unwrap();
        assert_eq!(other.get("k").await.unwrap().unwrap(), b"v".to_vec());
    }
}
