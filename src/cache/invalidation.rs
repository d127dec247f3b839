//! Explicit cache invalidation for post and comment writes.
//!
//! Every write path that mutates a post or a comment calls
//! [`InvalidationCoordinator::invalidate`] after the store write succeeds.
//! Deletions are attempted one key at a time; a failure on one key is
//! recorded in the report and the remaining keys are still attempted.

use std::collections::BTreeSet;
use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::application::localization::Localization;
use crate::domain::entities::PostRecord;
use crate::util::timezone::display_date;

use super::content::ContentCache;
use super::keys::CacheKey;

pub(crate) const METRIC_INVALIDATION: &str = "landing_cache_invalidation_total";

/// Size of the "popular tags with counts" widget whose key carries the count.
pub const POPULAR_TAG_WIDGET_LIMIT: usize = 15;

/// What changed.
#[derive(Debug, Clone, Copy)]
pub enum Invalidation<'a> {
    /// A comment of this post was created, toggled or deleted.
    Comment { post: &'a PostRecord },
    /// The post itself was created, updated or deleted.
    Post(&'a PostRecord),
}

impl Invalidation<'_> {
    fn post(&self) -> &PostRecord {
        match self {
            Invalidation::Comment { post } | Invalidation::Post(post) => post,
        }
    }

    fn entity(&self) -> &'static str {
        match self {
            Invalidation::Comment { .. } => "comment",
            Invalidation::Post(_) => "post",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum KeyOutcome {
    Deleted,
    /// Nothing was cached under the key.
    Absent,
    /// The backend rejected the delete.
    Failed(String),
    /// The key could not be computed.
    Skipped(String),
}

impl KeyOutcome {
    fn label(&self) -> &'static str {
        match self {
            KeyOutcome::Deleted => "deleted",
            KeyOutcome::Absent => "absent",
            KeyOutcome::Failed(_) => "failed",
            KeyOutcome::Skipped(_) => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyAttempt {
    pub key: String,
    #[serde(flatten)]
    pub outcome: KeyOutcome,
}

/// Per-key results of one invalidation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    pub attempts: Vec<KeyAttempt>,
}

impl InvalidationReport {
    fn push(&mut self, key: impl Into<String>, outcome: KeyOutcome) {
        self.attempts.push(KeyAttempt {
            key: key.into(),
            outcome,
        });
    }

    /// Keys a delete was issued for.
    pub fn targeted_keys(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|attempt| !matches!(attempt.outcome, KeyOutcome::Skipped(_)))
            .map(|attempt| attempt.key.as_str())
            .collect()
    }

    pub fn count(&self, label: &str) -> usize {
        self.attempts
            .iter()
            .filter(|attempt| attempt.outcome.label() == label)
            .count()
    }

    pub fn merge(&mut self, other: InvalidationReport) {
        self.attempts.extend(other.attempts);
    }
}

#[derive(Clone)]
pub struct InvalidationCoordinator {
    cache: ContentCache,
    localization: Arc<Localization>,
}

impl InvalidationCoordinator {
    pub fn new(cache: ContentCache, localization: Arc<Localization>) -> Self {
        Self {
            cache,
            localization,
        }
    }

    /// Delete every key derived from the changed entity. Never fails.
    pub async fn invalidate(&self, change: Invalidation<'_>) -> InvalidationReport {
        let post = change.post();
        let mut report = InvalidationReport::default();

        for key in self.detail_keys(post, &mut report) {
            self.delete(&key, &mut report).await;
        }
        self.delete(&CacheKey::PostComments { post_id: post.id }.to_string(), &mut report)
            .await;

        if let Invalidation::Post(_) = change {
            for key in self.foreign_slug_keys(post) {
                self.delete(&key, &mut report).await;
            }
            for key in self.post_wide_keys(post) {
                self.delete(&key.to_string(), &mut report).await;
            }
        }

        info!(
            entity = change.entity(),
            post_id = post.id,
            deleted = report.count("deleted"),
            absent = report.count("absent"),
            failed = report.count("failed"),
            skipped = report.count("skipped"),
            "Cache invalidation complete"
        );

        report
    }

    /// `post_detail_*` keys for each configured language the post is
    /// translated into. Languages with a translation but no slug are
    /// recorded as skipped.
    fn detail_keys(&self, post: &PostRecord, report: &mut InvalidationReport) -> Vec<String> {
        let date = display_date(post.publish, self.localization.display_timezone());
        let mut keys = Vec::new();

        for language in self.localization.languages() {
            if !post.translations.contains_key(language) {
                continue;
            }
            match post.slug_for(language) {
                Some(slug) => keys.push(CacheKey::post_detail(date, slug, language).to_string()),
                None => {
                    let placeholder = format!(
                        "post_detail_{}_{}_{}_?_{language}",
                        date.year, date.month, date.day
                    );
                    report.push(
                        placeholder,
                        KeyOutcome::Skipped(format!("post {} has no `{language}` slug", post.id)),
                    );
                    counter!(METRIC_INVALIDATION, "outcome" => "skipped").increment(1);
                }
            }
        }

        keys
    }

    /// Detail keys a language serves under another language's slug: slug
    /// redirects and untranslated fallback pages.
    fn foreign_slug_keys(&self, post: &PostRecord) -> Vec<String> {
        let date = display_date(post.publish, self.localization.display_timezone());
        let slugs: BTreeSet<&str> = post
            .translations
            .values()
            .map(|translation| translation.slug.as_str())
            .filter(|slug| !slug.is_empty())
            .collect();

        let mut keys = Vec::new();
        for language in self.localization.languages() {
            let own = post.slug_for(language);
            for &slug in &slugs {
                if own != Some(slug) {
                    keys.push(CacheKey::post_detail(date, slug, language).to_string());
                }
            }
        }
        keys
    }

    fn post_wide_keys(&self, post: &PostRecord) -> Vec<CacheKey> {
        let mut keys = Vec::new();
        for language in self.localization.languages() {
            keys.push(CacheKey::all_categories(language.as_str()));
            keys.push(CacheKey::all_tags(language.as_str()));
            keys.push(CacheKey::popular_tags(language.as_str(), None));
            keys.push(CacheKey::popular_tags(
                language.as_str(),
                Some(POPULAR_TAG_WIDGET_LIMIT),
            ));
            keys.push(CacheKey::similar_posts(post.id, language.as_str()));
        }
        keys.push(CacheKey::PostNavigation { post_id: post.id });
        keys
    }

    async fn delete(&self, key: &str, report: &mut InvalidationReport) {
        let outcome = match self.cache.try_delete(key).await {
            Ok(true) => KeyOutcome::Deleted,
            Ok(false) => KeyOutcome::Absent,
            Err(err) => {
                warn!(
                    target = "landing_news::cache::invalidation",
                    key,
                    backend = self.cache.backend_name(),
                    error = %err,
                    "Cache key deletion failed"
                );
                KeyOutcome::Failed(err.to_string())
            }
        };
        counter!(METRIC_INVALIDATION, "outcome" => outcome.label()).increment(1);
        report.push(key, outcome);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use time::macros::datetime;

    use super::*;
    use crate::cache::{CacheBackend, CacheConfig, CacheError, MemoryCache};
    use crate::domain::posts::fixtures::post;

    fn localization() -> Arc<Localization> {
        Arc::new(
            Localization::new(
                vec!["es".to_string(), "en".to_string(), "pt".to_string()],
                "es",
                chrono_tz::America::Santiago,
            )
            .expect("localization"),
        )
    }

    fn coordinator(backend: Arc<dyn CacheBackend>) -> InvalidationCoordinator {
        InvalidationCoordinator::new(ContentCache::new(backend), localization())
    }

    #[tokio::test]
    async fn comment_change_targets_one_detail_key_per_translation() {
        let memory = Arc::new(MemoryCache::new(&CacheConfig::default()));
        let ttl = Duration::from_secs(60);
        memory
            .set("post_detail_2024_2_29_lanzamiento_es", "{}".into(), ttl)
            .await
            .expect("seed");
        memory
            .set("post_comments_5", "[]".into(), ttl)
            .await
            .expect("seed");

        let post = post(
            5,
            datetime!(2024-03-01 02:30 UTC),
            &[("es", "Lanzamiento", "lanzamiento"), ("en", "Launch", "launch")],
        );
        let report = coordinator(memory.clone())
            .invalidate(Invalidation::Comment { post: &post })
            .await;

        assert_eq!(
            report.targeted_keys(),
            vec![
                "post_detail_2024_2_29_lanzamiento_es",
                "post_detail_2024_2_29_launch_en",
                "post_comments_5",
            ]
        );
        assert_eq!(report.count("deleted"), 2);
        assert_eq!(report.count("absent"), 1);
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn post_change_also_clears_taxonomy_for_every_language() {
        let post = post(8, datetime!(2024-06-10 15:00 UTC), &[("es", "Hola", "hola")]);
        let report = coordinator(Arc::new(MemoryCache::new(&CacheConfig::default())))
            .invalidate(Invalidation::Post(&post))
            .await;
        let keys = report.targeted_keys();

        for language in ["es", "en", "pt"] {
            assert!(keys.contains(&format!("all_categories_{language}").as_str()));
            assert!(keys.contains(&format!("all_tags_{language}").as_str()));
            assert!(keys.contains(&format!("popular_tags_{language}").as_str()));
        }
        assert!(keys.contains(&"post_navigation_8"));
        let detail: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|key| key.starts_with("post_detail_"))
            .collect();
        assert_eq!(
            detail,
            vec![
                "post_detail_2024_6_10_hola_es",
                "post_detail_2024_6_10_hola_en",
                "post_detail_2024_6_10_hola_pt",
            ]
        );
    }

    #[tokio::test]
    async fn post_change_clears_redirects_under_other_language_slugs() {
        let memory = Arc::new(MemoryCache::new(&CacheConfig::default()));
        memory
            .set(
                "post_detail_2024_6_10_hola_en",
                "redirect:/en/news/2024/6/10/hello/".into(),
                Duration::from_secs(60),
            )
            .await
            .expect("seed");

        let post = post(
            9,
            datetime!(2024-06-10 15:00 UTC),
            &[("es", "Hola", "hola"), ("en", "Hello", "hello")],
        );
        let comment = coordinator(memory.clone())
            .invalidate(Invalidation::Comment { post: &post })
            .await;
        assert!(!comment.targeted_keys().contains(&"post_detail_2024_6_10_hola_en"));

        let report = coordinator(memory.clone())
            .invalidate(Invalidation::Post(&post))
            .await;
        let keys = report.targeted_keys();
        for key in [
            "post_detail_2024_6_10_hola_en",
            "post_detail_2024_6_10_hola_pt",
            "post_detail_2024_6_10_hello_es",
            "post_detail_2024_6_10_hello_pt",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn missing_slug_is_skipped_without_aborting() {
        let mut post = post(
            3,
            datetime!(2024-06-10 15:00 UTC),
            &[("es", "Hola", "hola"), ("en", "Hello", "")],
        );
        post.translations.entry("pt".to_string()).or_default();

        let report = coordinator(Arc::new(MemoryCache::new(&CacheConfig::default())))
            .invalidate(Invalidation::Comment { post: &post })
            .await;

        assert_eq!(report.count("skipped"), 2);
        assert_eq!(
            report.targeted_keys(),
            vec!["post_detail_2024_6_10_hola_es", "post_comments_3"]
        );
    }

    struct FlakyBackend;

    #[async_trait]
    impl CacheBackend for FlakyBackend {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, CacheError> {
            if key.ends_with("_es") {
                Err(CacheError::unavailable("flaky", "timeout"))
            } else {
                Ok(true)
            }
        }
    }

    #[tokio::test]
    async fn backend_failures_are_reported_not_raised() {
        let post = post(
            4,
            datetime!(2024-06-10 15:00 UTC),
            &[("es", "Hola", "hola"), ("en", "Hello", "hello")],
        );
        let report = coordinator(Arc::new(FlakyBackend))
            .invalidate(Invalidation::Comment { post: &post })
            .await;

        assert_eq!(report.count("failed"), 1);
        assert_eq!(report.count("deleted"), 2);
        assert!(matches!(
            report.attempts[0].outcome,
            KeyOutcome::Failed(ref reason) if reason.contains("timeout")
        ));
    }
}
