//! Configuration Module
//!
//! Handles loading cache configuration from environment variables or JSON.

use std::env;
use std::time::Duration;

use serde::Deserialize;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Default TTL in milliseconds, None or 0 = entries never expire
    pub default_ttl_ms: Option<u64>,
    /// Tracing filter used by the binary
    pub log_filter: String,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TTLRU_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `TTLRU_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: none)
    /// - `TTLRU_LOG` - Tracing filter (default: "ttlru=info")
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Replaces each field whose environment variable is set and parses;
    /// every other field keeps its current value.
    pub fn with_env_overrides(self) -> Self {
        Self {
            capacity: env::var("TTLRU_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.capacity),
            default_ttl_ms: env::var("TTLRU_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(self.default_ttl_ms),
            log_filter: env::var("TTLRU_LOG").unwrap_or(self.log_filter),
        }
    }

    /// Parses a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The default TTL as a duration; zero means no expiry.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            default_ttl_ms: None,
            log_filter: "ttlru=info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.default_ttl_ms, None);
        assert_eq!(config.default_ttl(), None);
        assert_eq!(config.log_filter, "ttlru=info");
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("TTLRU_CAPACITY");
        env::remove_var("TTLRU_DEFAULT_TTL_MS");
        env::remove_var("TTLRU_LOG");

        let config = CacheConfig::from_env();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_config_env_overrides_keep_unset_fields() {
        env::remove_var("TTLRU_CAPACITY");
        env::remove_var("TTLRU_DEFAULT_TTL_MS");
        env::remove_var("TTLRU_LOG");

        let base = CacheConfig {
            capacity: 16,
            default_ttl_ms: Some(500),
            log_filter: "ttlru=debug".to_string(),
        };

        assert_eq!(base.clone().with_env_overrides(), base);
    }

    #[test]
    fn test_config_from_json_partial() {
        let config = CacheConfig::from_json(r#"{"capacity": 8, "default_ttl_ms": 1500}"#).unwrap();
        assert_eq!(config.capacity, 8);
        assert_eq!(config.default_ttl(), Some(Duration::from_millis(1500)));
        assert_eq!(config.log_filter, "ttlru=info");
    }

    #[test]
    fn test_config_zero_ttl_means_no_expiry() {
        let config = CacheConfig {
            default_ttl_ms: Some(0),
            ..CacheConfig::default()
        };
        assert_eq!(config.default_ttl(), None);
    }

    #[test]
    fn test_config_rejects_bad_json() {
        assert!(CacheConfig::from_json(r#"{"capacity": "many"}"#).is_err());
    }
}
