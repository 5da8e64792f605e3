//! Similarity-gated record store.
//!
//! [`RecordStore`] is the single authority over the key → record map. It
//! decides cache hits by comparing fingerprints, keeps the map under a hard
//! capacity, and persists the whole history through an injected [`KvStore`].
//!
//! Concurrency: every per-key operation first takes that key's async mutex,
//! so operations on one key run one at a time while other keys proceed. A
//! key's mutex lives in the lock map only while someone holds or waits on it.
//! Writes are computed on a copy of the history, persisted, and only then
//! swapped in, all under the history write lock. A failed `put` therefore
//! leaves the in-memory view untouched, and `stats`/`clear_all` never see a
//! half-applied write.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};

use crate::Error;
use crate::config::AppConfig;
use crate::fingerprint::{self, DEFAULT_THRESHOLD, Fingerprint, validate_threshold};
use crate::key::CacheKey;
use crate::storage::KvStore;

pub mod record;

pub use record::{CacheCheck, CacheStats, History, Metadata, Record};

/// Tunables for a [`RecordStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Storage keys are `<namespace>:history`.
    pub namespace: String,
    pub max_records: usize,
    pub default_threshold: f64,
    pub recent_window: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            namespace: "gist".into(),
            max_records: 1000,
            default_threshold: DEFAULT_THRESHOLD,
            recent_window: Duration::hours(24),
        }
    }
}

impl From<&AppConfig> for StoreOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            max_records: config.max_records,
            default_threshold: config.default_threshold,
            recent_window: config.recent_window(),
        }
    }
}

/// Result of [`RecordStore::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Resolved {
    pub artifact: String,
    /// True when the artifact came from the cache rather than the generator.
    pub from_cache: bool,
    pub similarity: Option<f64>,
}

type KeyLocks = Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>;

/// Exclusive hold on one key. Dropping it removes the key's map entry once no
/// other task holds or waits on it.
struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: CacheKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.key);
        }
    }
}

/// Per-key record store with similarity-gated reuse.
pub struct RecordStore {
    storage: Arc<dyn KvStore>,
    storage_key: String,
    options: StoreOptions,
    history: RwLock<History>,
    key_locks: KeyLocks,
    clock: Mutex<DateTime<Utc>>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("storage_key", &self.storage_key)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Load the history from `storage` (or start empty) and build a store.
    pub async fn open(storage: Arc<dyn KvStore>, options: StoreOptions) -> Result<Self, Error> {
        let storage_key = format!("{}:history", options.namespace);

        let history = match storage
            .get(&storage_key)
            .await
            .map_err(|e| Error::storage("load", &storage_key, e))?
        {
            Some(bytes) => serde_json::from_slice::<History>(&bytes).map_err(|e| Error::storage("load", &storage_key, e))?,
            None => History::default(),
        };

        tracing::debug!(key = %storage_key, records = history.records.len(), "record store opened");

        let clock = history.latest_timestamp().unwrap_or(DateTime::<Utc>::MIN_UTC);

        Ok(Self {
            storage,
            storage_key,
            options,
            history: RwLock::new(history),
            key_locks: Mutex::new(HashMap::new()),
            clock: Mutex::new(clock),
        })
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Look up `raw_id` and decide whether `content` is close enough to what
    /// was stored to reuse the artifact.
    ///
    /// Never moves the stored fingerprint. A hit refreshes the record's
    /// in-memory access time so it ranks as recent for eviction.
    pub async fn check_cache(&self, raw_id: &str, content: &str, threshold: Option<f64>) -> Result<CacheCheck, Error> {
        let key = CacheKey::parse(raw_id)?;
        let threshold = self.threshold(threshold)?;
        let observed = fingerprint::fingerprint(content);

        let _held = self.lock_key(&key).await;
        Ok(self.check_locked(&key, observed, threshold).await)
    }

    /// Persist new source content and its freshly produced artifact.
    ///
    /// This is the only operation that moves a record's fingerprint. Returns
    /// the record as committed.
    pub async fn store_content(
        &self, raw_id: &str, content: &str, artifact: impl Into<String>, threshold: Option<f64>,
        metadata: Option<Metadata>,
    ) -> Result<Record, Error> {
        let key = CacheKey::parse(raw_id)?;
        let threshold = self.threshold(threshold)?;
        let artifact = validate_artifact(artifact.into())?;
        let observed = fingerprint::fingerprint(content);

        let _held = self.lock_key(&key).await;
        self.write_content(&key, observed, artifact, threshold, metadata.unwrap_or_default())
            .await
    }

    /// Replace only the artifact of an existing record.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when nothing has been stored for the key and
    /// `Error::InvalidInput` for an empty artifact.
    pub async fn update_artifact(
        &self, raw_id: &str, artifact: impl Into<String>, metadata: Option<Metadata>,
    ) -> Result<Record, Error> {
        let key = CacheKey::parse(raw_id)?;
        let artifact = validate_artifact(artifact.into())?;
        let metadata = metadata.unwrap_or_default();

        let _held = self.lock_key(&key).await;
        let record = self
            .commit("update_artifact", &key, |history, now| {
                let record = history
                    .records
                    .get_mut(&key)
                    .ok_or_else(|| Error::NotFound(key.to_string()))?;
                record.replace_artifact(artifact, metadata, now);
                let committed = record.clone();
                history.record_write(now);
                Ok(committed)
            })
            .await?;

        tracing::debug!(key = %key, "artifact updated");
        Ok(record)
    }

    /// Check the cache and, on a miss, generate and store a new artifact.
    ///
    /// The key stays locked from the check through the store, so concurrent
    /// misses for the same key call `generate` once.
    pub async fn resolve<F, Fut, E>(
        &self, raw_id: &str, content: &str, threshold: Option<f64>, generate: F,
    ) -> Result<Resolved, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: std::fmt::Display,
    {
        let key = CacheKey::parse(raw_id)?;
        let threshold = self.threshold(threshold)?;
        let observed = fingerprint::fingerprint(content);

        let _held = self.lock_key(&key).await;

        let check = self.check_locked(&key, observed, threshold).await;
        if let (true, Some(artifact)) = (check.cached, check.artifact) {
            return Ok(Resolved { artifact, from_cache: true, similarity: check.similarity });
        }

        let artifact = generate().await.map_err(|e| Error::Generation(e.to_string()))?;
        let artifact = validate_artifact(artifact)
            .map_err(|_| Error::Generation("generator produced an empty artifact".into()))?;
        self.write_content(&key, observed, artifact.clone(), threshold, Metadata::new())
            .await?;

        Ok(Resolved { artifact, from_cache: false, similarity: check.similarity })
    }

    /// The current record for `raw_id`, without touching any counters.
    pub async fn get_latest(&self, raw_id: &str) -> Result<Option<Record>, Error> {
        let key = CacheKey::parse(raw_id)?;
        Ok(self.history.read().await.records.get(&key).cloned())
    }

    /// Cache-wide counters as of now.
    pub async fn stats(&self) -> CacheStats {
        self.history
            .read()
            .await
            .stats(Utc::now(), self.options.recent_window)
    }

    /// Drop every record and reset the counters, returning how many records
    /// were dropped.
    pub async fn clear_all(&self) -> Result<usize, Error> {
        let mut history = self.history.write().await;
        let now = self.now();
        let cleared = History { last_modified: Some(now), ..Default::default() };

        self.persist("clear_all", &self.storage_key, &cleared).await?;
        let dropped = history.records.len();
        *history = cleared;
        drop(history);

        tracing::info!(dropped, "cache cleared");
        Ok(dropped)
    }

    #[cfg(test)]
    fn held_key_count(&self) -> usize {
        self.key_locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn threshold(&self, threshold: Option<f64>) -> Result<f64, Error> {
        validate_threshold(threshold.unwrap_or(self.options.default_threshold))
    }

    async fn check_locked(&self, key: &CacheKey, observed: Fingerprint, threshold: f64) -> CacheCheck {
        let stored = {
            let history = self.history.read().await;
            history
                .records
                .get(key)
                .map(|r| (r.fingerprint, r.artifact.clone()))
        };

        let Some((stored_fp, artifact)) = stored else {
            tracing::debug!(key = %key, "cache miss: never stored");
            return CacheCheck {
                cached: false,
                artifact: None,
                similarity: None,
                threshold,
                observed_fingerprint: observed,
                change: None,
            };
        };

        let similarity = fingerprint::similarity(stored_fp, observed);
        let cached = similarity >= threshold && artifact.is_some();

        if cached {
            let now = self.now();
            if let Some(record) = self.history.write().await.records.get_mut(key) {
                record.last_accessed_at = now;
            }
        }

        tracing::debug!(key = %key, similarity, threshold, cached, "cache check");

        CacheCheck {
            cached,
            artifact: if cached { artifact } else { None },
            similarity: Some(similarity),
            threshold,
            observed_fingerprint: observed,
            change: Some(fingerprint::classify(stored_fp, observed)),
        }
    }

    async fn write_content(
        &self, key: &CacheKey, observed: Fingerprint, artifact: String, threshold: f64, metadata: Metadata,
    ) -> Result<Record, Error> {
        let record = self
            .commit("store_content", key, |history, now| {
                let committed = match history.records.get_mut(key) {
                    Some(record) => {
                        record.replace_content(observed, artifact, threshold, metadata, now);
                        record.clone()
                    }
                    None => {
                        let record = Record::new(key.clone(), observed, artifact, threshold, metadata, now);
                        history.records.insert(key.clone(), record.clone());
                        record
                    }
                };
                history.record_write(now);
                Ok(committed)
            })
            .await?;

        tracing::debug!(key = %key, fingerprint = %observed, "content stored");
        Ok(record)
    }

    /// Apply `mutate` to a copy of the history, persist it, then swap it in.
    async fn commit<F, T>(&self, operation: &'static str, key: &CacheKey, mutate: F) -> Result<T, Error>
    where
        F: FnOnce(&mut History, DateTime<Utc>) -> Result<T, Error>,
    {
        let mut history = self.history.write().await;
        let mut candidate = history.clone();
        let now = self.now();

        let output = mutate(&mut candidate, now)?;
        let evicted = candidate.evict_to(self.options.max_records);

        self.persist(operation, key.as_str(), &candidate).await?;
        *history = candidate;
        drop(history);

        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), max_records = self.options.max_records, "evicted records");
        }

        Ok(output)
    }

    async fn persist(&self, operation: &'static str, key: &str, history: &History) -> Result<(), Error> {
        let bytes = serde_json::to_vec(history).map_err(|e| Error::storage(operation, key, e))?;
        self.storage
            .put(&self.storage_key, bytes)
            .await
            .map_err(|e| Error::storage(operation, key, e))
    }

    async fn lock_key(&self, key: &CacheKey) -> KeyGuard<'_> {
        let lock = {
            let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.clone()).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        KeyGuard { locks: &self.key_locks, key: key.clone(), guard: Some(guard) }
    }

    /// Strictly increasing wall-clock time, so recency ranking has no ties.
    fn now(&self) -> DateTime<Utc> {
        let mut last = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now().max(*last + Duration::microseconds(1));
        *last = now;
        now
    }
}

fn validate_artifact(artifact: String) -> Result<String, Error> {
    if artifact.trim().is_empty() {
        return Err(Error::InvalidInput("artifact cannot be empty".into()));
    }
    Ok(artifact)
}
