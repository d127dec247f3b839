//! Localized news URLs.
//!
//! A post is publicly identified by `(year, month, day, slug, language)`
//! with the date taken in the display timezone. Paths for the default
//! language carry no prefix; every other language is served under `/{code}`.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::application::localization::Localization;
use crate::application::repos::{PostsRepo, RepoError};
use crate::cache::{CacheKey, ContentCache, REDIRECT_PREFIX, REDIRECT_TTL};
use crate::domain::entities::PostRecord;
use crate::domain::error::DomainError;
use crate::util::timezone::{DisplayDate, day_window, display_date};

/// What to do when a post lacks a slug in the requested language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugFallback {
    /// Fail. Used for canonical links.
    Strict,
    /// Use the first configured language that has a slug. Listing cards only.
    AnyLanguage,
}

/// Result of resolving a detail path.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Box<PostRecord>),
    /// The post exists but the requested language uses another slug.
    Redirect(String),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageUrl {
    pub language: String,
    pub url: String,
}

#[derive(Clone)]
pub struct LocalizedUrlResolver {
    posts: Arc<dyn PostsRepo>,
    cache: ContentCache,
    localization: Arc<Localization>,
}

impl LocalizedUrlResolver {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        cache: ContentCache,
        localization: Arc<Localization>,
    ) -> Self {
        Self {
            posts,
            cache,
            localization,
        }
    }

    pub fn localization(&self) -> &Localization {
        &self.localization
    }

    /// Detail path of `post` in `language`.
    pub fn detail_path(
        &self,
        post: &PostRecord,
        language: &str,
        fallback: SlugFallback,
    ) -> Result<String, DomainError> {
        let (slug_language, slug) = match (post.slug_for(language), fallback) {
            (Some(slug), _) => (language, slug),
            (None, SlugFallback::Strict) => return Err(DomainError::untranslated(language)),
            (None, SlugFallback::AnyLanguage) => self
                .localization
                .languages()
                .iter()
                .find_map(|code| post.slug_for(code).map(|slug| (code.as_str(), slug)))
                .ok_or_else(|| DomainError::untranslated(language))?,
        };
        let date = display_date(post.publish, self.localization.display_timezone());
        Ok(self.path_for(date, slug, slug_language))
    }

    fn path_for(&self, date: DisplayDate, slug: &str, language: &str) -> String {
        self.localization.localized_path(
            language,
            &format!("/news/{}/{}/{}/{slug}/", date.year, date.month, date.day),
        )
    }

    /// Absolute URL of every language the post has a slug in, in configured order.
    pub fn language_urls(&self, post: &PostRecord, base_url: &str) -> Vec<LanguageUrl> {
        let base = base_url.trim_end_matches('/');
        self.localization
            .languages()
            .iter()
            .filter_map(|language| {
                self.detail_path(post, language, SlugFallback::Strict)
                    .ok()
                    .map(|path| LanguageUrl {
                        language: language.clone(),
                        url: format!("{base}{path}"),
                    })
            })
            .collect()
    }

    /// Resolve a detail path to a post, a slug-correcting redirect or nothing.
    pub async fn resolve(
        &self,
        year: i32,
        month: u32,
        day: u32,
        slug: &str,
        language: &str,
    ) -> Result<Resolution, RepoError> {
        let date = DisplayDate { year, month, day };
        let key = CacheKey::post_detail(date, slug, language);

        if let Some(raw) = self.cache.get_raw(&key).await {
            if let Some(target) = raw.strip_prefix(REDIRECT_PREFIX) {
                return Ok(Resolution::Redirect(target.to_string()));
            }
            if let Ok(post) = serde_json::from_str::<PostRecord>(&raw) {
                return Ok(Resolution::Found(Box::new(post)));
            }
        }

        let tz = self.localization.display_timezone();
        let Some((start, end)) = day_window(tz, year, month, day) else {
            return Ok(Resolution::NotFound);
        };
        debug!(
            year,
            month,
            day,
            %start,
            %end,
            "Resolving news detail"
        );

        let candidates = self.posts.list_published_in_window(start, end).await?;
        let Some(post) = candidates.into_iter().find(|post| {
            post.translations
                .values()
                .any(|translation| translation.slug == slug)
        }) else {
            return Ok(Resolution::NotFound);
        };

        if let Some(correct) = post.slug_for(language).filter(|correct| *correct != slug) {
            let target = self.path_for(display_date(post.publish, tz), correct, language);
            self.cache
                .set_raw(&key, format!("{REDIRECT_PREFIX}{target}"), REDIRECT_TTL)
                .await;
            return Ok(Resolution::Redirect(target));
        }

        self.cache.set_json(&key, &post).await;
        Ok(Resolution::Found(Box::new(post)))
    }
}
