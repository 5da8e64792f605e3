//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (GIST_CACHE_*)
//! 2. TOML config file (if GIST_CACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::fingerprint::DEFAULT_THRESHOLD;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (GIST_CACHE_*)
/// 2. TOML config file (if GIST_CACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database backing the key/value store.
    ///
    /// Set via GIST_CACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Prefix for every storage key this cache writes.
    ///
    /// Set via GIST_CACHE_NAMESPACE environment variable.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Maximum number of resident records before eviction.
    ///
    /// Set via GIST_CACHE_MAX_RECORDS environment variable.
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Similarity threshold used when a caller omits one.
    ///
    /// Set via GIST_CACHE_DEFAULT_THRESHOLD environment variable.
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,

    /// Trailing window, in hours, counted as recent activity in stats.
    ///
    /// Set via GIST_CACHE_RECENT_WINDOW_HOURS environment variable.
    #[serde(default = "default_recent_window_hours")]
    pub recent_window_hours: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./gist-cache.sqlite")
}

fn default_namespace() -> String {
    "gist".into()
}

fn default_max_records() -> usize {
    1000
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_recent_window_hours() -> u32 {
    24
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            namespace: default_namespace(),
            max_records: default_max_records(),
            default_threshold: default_threshold(),
            recent_window_hours: default_recent_window_hours(),
        }
    }
}

impl AppConfig {
    /// Recent-activity window as a chrono Duration.
    pub fn recent_window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.recent_window_hours))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("GIST_CACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("GIST_CACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./gist-cache.sqlite"));
        assert_eq!(config.namespace, "gist");
        assert_eq!(config.max_records, 1000);
        assert_eq!(config.default_threshold, 0.8);
        assert_eq!(config.recent_window_hours, 24);
    }

    #[test]
    fn test_recent_window_duration() {
        let config = AppConfig::default();
        assert_eq!(config.recent_window(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string("max_records = 50\nnamespace = \"test\""))
            .extract()
            .unwrap();
        assert_eq!(config.max_records, 50);
        assert_eq!(config.namespace, "test");
        assert_eq!(config.default_threshold, 0.8);
    }
}
