//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

const MAX_RECORDS_LIMIT: usize = 1_000_000;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `namespace` is empty or contains `:`
    /// - `max_records` is 0 or exceeds one million
    /// - `default_threshold` is outside `[0, 1]`
    /// - `recent_window_hours` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::Invalid { field: "namespace".into(), reason: "must not be empty".into() });
        }
        if self.namespace.contains(':') {
            return Err(ConfigError::Invalid { field: "namespace".into(), reason: "must not contain ':'".into() });
        }

        if self.max_records == 0 {
            return Err(ConfigError::Invalid { field: "max_records".into(), reason: "must be greater than 0".into() });
        }
        if self.max_records > MAX_RECORDS_LIMIT {
            return Err(ConfigError::Invalid {
                field: "max_records".into(),
                reason: format!("must not exceed {MAX_RECORDS_LIMIT}"),
            });
        }

        if !(0.0..=1.0).contains(&self.default_threshold) {
            return Err(ConfigError::Invalid {
                field: "default_threshold".into(),
                reason: "must be within [0, 1]".into(),
            });
        }

        if self.recent_window_hours == 0 {
            return Err(ConfigError::Invalid {
                field: "recent_window_hours".into(),
                reason: "must be at least 1 hour".into(),
            });
        }

        if self.max_records < 10 {
            tracing::warn!(
                max_records = self.max_records,
                "max_records is very small; most writes will evict"
            );
        }

        Ok(())
    }
}
