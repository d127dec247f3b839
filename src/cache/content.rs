//! Best-effort typed facade over a [`CacheBackend`].
//!
//! Reads that fail for any reason count as misses and writes that fail are
//! dropped. Callers always fall back to the authoritative store, so nothing
//! here returns an error except [`ContentCache::try_delete`], which feeds the
//! invalidation report.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use super::backend::{CacheBackend, CacheError, DisabledCache};
use super::keys::CacheKey;

pub(crate) const METRIC_CACHE_HIT: &str = "landing_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "landing_cache_miss_total";
pub(crate) const METRIC_CACHE_ERROR: &str = "landing_cache_error_total";

#[derive(Clone)]
pub struct ContentCache {
    backend: Arc<dyn CacheBackend>,
}

impl ContentCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledCache))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Raw string stored under `key`.
    pub async fn get_raw(&self, key: &CacheKey) -> Option<String> {
        let rendered = key.to_string();
        match self.backend.get(&rendered).await {
            Ok(Some(value)) => {
                counter!(METRIC_CACHE_HIT, "namespace" => key.namespace()).increment(1);
                Some(value)
            }
            Ok(None) => {
                counter!(METRIC_CACHE_MISS, "namespace" => key.namespace()).increment(1);
                None
            }
            Err(err) => {
                self.record_failure("get", &rendered, key, &err);
                None
            }
        }
    }

    /// Decoded JSON value under `key`; undecodable values read as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let raw = self.get_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                self.record_failure("decode", &key.to_string(), key, &CacheError::from(err));
                None
            }
        }
    }

    pub async fn set_raw(&self, key: &CacheKey, value: String, ttl: Duration) {
        let rendered = key.to_string();
        if let Err(err) = self.backend.set(&rendered, value, ttl).await {
            self.record_failure("set", &rendered, key, &err);
        }
    }

    /// Store `value` as JSON with the key's default TTL.
    pub async fn set_json<T: Serialize>(&self, key: &CacheKey, value: &T) {
        match serde_json::to_string(value) {
            Ok(encoded) => self.set_raw(key, encoded, key.ttl()).await,
            Err(err) => {
                self.record_failure("encode", &key.to_string(), key, &CacheError::from(err));
            }
        }
    }

    /// Delete a rendered key, surfacing the backend result.
    pub async fn try_delete(&self, key: &str) -> Result<bool, CacheError> {
        self.backend.delete(key).await
    }

    /// Read-through helper: cached value, or `load` then store the result.
    ///
    /// Errors from `load` are returned untouched and nothing is cached.
    pub async fn get_or_load<T, E, F, Fut>(&self, key: &CacheKey, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get_json::<T>(key).await {
            return Ok(cached);
        }
        let value = load().await?;
        self.set_json(key, &value).await;
        Ok(value)
    }

    fn record_failure(&self, op: &'static str, rendered: &str, key: &CacheKey, err: &CacheError) {
        counter!(
            METRIC_CACHE_ERROR,
            "namespace" => key.namespace(),
            "op" => op
        )
        .increment(1);
        warn!(
            target = "landing_news::cache",
            op,
            key = rendered,
            backend = self.backend.name(),
            error = %err,
            "Cache operation failed; continuing without cache"
        );
    }
}
