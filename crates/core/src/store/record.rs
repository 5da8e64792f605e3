//! Record and history types owned by the record store.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::{ChangeLevel, Fingerprint};
use crate::key::CacheKey;

/// Free-form metadata attached to a record, merged by shallow overwrite.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// The cached state for one canonical key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Record {
    pub key: CacheKey,
    /// Fingerprint of the last stored source content.
    #[schemars(with = "String")]
    pub fingerprint: Fingerprint,
    pub artifact: Option<String>,
    /// Threshold in effect at the last content write. Informational only.
    pub similarity_threshold: f64,
    #[schemars(with = "String")]
    pub created_at: DateTime<Utc>,
    #[schemars(with = "String")]
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Record {
    pub(crate) fn new(
        key: CacheKey, fingerprint: Fingerprint, artifact: String, threshold: f64, metadata: Metadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            fingerprint,
            artifact: Some(artifact),
            similarity_threshold: threshold,
            created_at: now,
            last_accessed_at: now,
            access_count: 1,
            metadata,
        }
    }

    /// New source content with a freshly produced artifact.
    pub(crate) fn replace_content(
        &mut self, fingerprint: Fingerprint, artifact: String, threshold: f64, metadata: Metadata, now: DateTime<Utc>,
    ) {
        self.fingerprint = fingerprint;
        self.artifact = Some(artifact);
        self.similarity_threshold = threshold;
        self.metadata.extend(metadata);
        self.touch(now);
    }

    /// Revised artifact for unchanged content; the fingerprint stays put.
    pub(crate) fn replace_artifact(&mut self, artifact: String, metadata: Metadata, now: DateTime<Utc>) {
        self.artifact = Some(artifact);
        self.metadata.extend(metadata);
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.access_count += 1;
        self.last_accessed_at = now;
    }
}

/// Everything the store persists: the records plus cache-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub records: BTreeMap<CacheKey, Record>,
    #[serde(default)]
    pub total_accesses: u64,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl History {
    pub(crate) fn record_write(&mut self, now: DateTime<Utc>) {
        self.total_accesses += 1;
        self.last_modified = Some(now);
    }

    /// Keep the `capacity` most recently accessed records, returning the keys
    /// that were dropped.
    pub(crate) fn evict_to(&mut self, capacity: usize) -> Vec<CacheKey> {
        if self.records.len() <= capacity {
            return Vec::new();
        }

        let mut ranked: Vec<(DateTime<Utc>, CacheKey)> = self
            .records
            .values()
            .map(|r| (r.last_accessed_at, r.key.clone()))
            .collect();
        ranked.sort_by(|a, b| (Reverse(a.0), &a.1).cmp(&(Reverse(b.0), &b.1)));

        let evicted: Vec<CacheKey> = ranked.into_iter().skip(capacity).map(|(_, key)| key).collect();
        for key in &evicted {
            self.records.remove(key);
        }
        evicted
    }

    /// Newest timestamp anywhere in the history.
    pub(crate) fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.records
            .values()
            .map(|r| r.last_accessed_at)
            .chain(self.last_modified)
            .max()
    }

    pub(crate) fn stats(&self, now: DateTime<Utc>, window: Duration) -> CacheStats {
        let cutoff = now - window;
        CacheStats {
            total_accesses: self.total_accesses,
            unique_keys: self.records.len(),
            last_modified: self.last_modified,
            recent_activity_count: self.records.values().filter(|r| r.last_accessed_at > cutoff).count(),
        }
    }
}

/// Outcome of a similarity-gated cache lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheCheck {
    pub cached: bool,
    /// Present only on a hit.
    pub artifact: Option<String>,
    /// Absent when the key has never been stored.
    pub similarity: Option<f64>,
    pub threshold: f64,
    #[schemars(with = "String")]
    pub observed_fingerprint: Fingerprint,
    /// Advisory change bucket, present whenever `similarity` is.
    pub change: Option<ChangeLevel>,
}

/// Cache-wide counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheStats {
    pub total_accesses: u64,
    pub unique_keys: usize,
    #[schemars(with = "Option<String>")]
    pub last_modified: Option<DateTime<Utc>>,
    /// Records accessed within the trailing activity window.
    pub recent_activity_count: usize,
}
