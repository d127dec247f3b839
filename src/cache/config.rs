//! Cache configuration.
//!
//! Selects the key-value backend and bounds the in-process store.

use std::num::NonZeroUsize;

use serde::Deserialize;

const DEFAULT_MAX_ENTRIES: usize = 2_000;
const DEFAULT_KEY_PREFIX: &str = "landing";

/// Which key-value store backs the content cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    Memory,
    Redis,
}

/// Cache configuration from `[cache]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Turn the whole cache layer off; every read misses.
    pub enabled: bool,
    pub backend: CacheBackendKind,
    /// Capacity of the in-process LRU store.
    pub max_entries: usize,
    /// Connection URL when `backend = "redis"`.
    pub redis_url: Option<String>,
    /// Namespace prepended to keys in shared stores.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackendKind::Memory,
            max_entries: DEFAULT_MAX_ENTRIES,
            redis_url: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            backend: settings.backend,
            max_entries: settings.max_entries,
            redis_url: settings.redis_url.clone(),
            key_prefix: settings.key_prefix.clone(),
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.is_enabled());
        assert_eq!(config.backend, CacheBackendKind::Memory);
        assert_eq!(config.max_entries, 2_000);
        assert_eq!(config.key_prefix, "landing");
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            max_entries: 0,
            ..Default::default()
        };
        assert_eq!(config.max_entries_non_zero().get(), 1);
    }

    #[test]
    fn backend_kind_deserializes_snake_case() {
        let kind: CacheBackendKind = serde_json::from_str("\"redis\"").expect("kind");
        assert_eq!(kind, CacheBackendKind::Redis);
    }
}
