//! Content cache for the news section.
//!
//! Query results are cached under deterministic keys (see [`CacheKey`]) in a
//! pluggable key-value store. The cache is strictly best-effort: a broken or
//! disabled backend only costs latency. Writes to posts and comments go
//! through [`InvalidationCoordinator`], which deletes every derived key and
//! reports what happened to each one.
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "memory"   # or "redis"
//! max_entries = 2000
//! # redis_url = "redis://127.0.0.1:6379/0"
//! key_prefix = "landing"
//! ```

mod backend;
mod config;
mod content;
mod invalidation;
mod keys;
mod lock;
mod redis_store;
mod store;

use std::sync::Arc;

use tracing::info;

pub use backend::{CacheBackend, CacheError, DisabledCache};
pub use config::{CacheBackendKind, CacheConfig};
pub use content::ContentCache;
pub use invalidation::{
    Invalidation, InvalidationCoordinator, InvalidationReport, KeyAttempt, KeyOutcome,
    POPULAR_TAG_WIDGET_LIMIT,
};
pub use keys::{
    CacheKey, DETAIL_TTL, LIST_TTL, NAVIGATION_TTL, POPULAR_TAGS_TTL, PostListKey,
    REDIRECT_PREFIX, REDIRECT_TTL, SIMILAR_POSTS_TTL, TAXONOMY_TTL, search_hash,
};
pub use redis_store::RedisCache;
pub use store::MemoryCache;

/// Build the content cache selected by `config`.
pub async fn build_content_cache(config: &CacheConfig) -> Result<ContentCache, CacheError> {
    if !config.is_enabled() {
        info!(target = "landing_news::cache", "Content cache disabled");
        return Ok(ContentCache::disabled());
    }

    let backend: Arc<dyn CacheBackend> = match config.backend {
        CacheBackendKind::Memory => Arc::new(MemoryCache::new(config)),
        CacheBackendKind::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                CacheError::unavailable("redis", "cache.redis_url is required for the redis backend")
            })?;
            Arc::new(RedisCache::connect(url, &config.key_prefix).await?)
        }
    };

    info!(
        target = "landing_news::cache",
        backend = backend.name(),
        max_entries = config.max_entries,
        "Content cache ready"
    );
    Ok(ContentCache::new(backend))
}

pub(crate) mod metrics_names {
    pub(crate) use super::content::{METRIC_CACHE_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_MISS};
    pub(crate) use super::invalidation::METRIC_INVALIDATION;
}
