use std::collections::BTreeMap;

use chrono_tz::Tz;
use tracing::info;

use crate::application::repos::{PostWriteParams, RepoError};
use crate::cache::Invalidation;
use crate::domain::entities::{PostRecord, PostTranslation};
use crate::domain::slug::{SlugAsyncError, SlugError, derive_slug, generate_unique_slug_async};
use crate::domain::text;
use crate::util::timezone::display_date;

use super::service::AdminPostService;
use super::types::{AdminPostError, PostChange, PostCommand, ensure_non_empty};

impl AdminPostService {
    pub async fn create_post(&self, command: PostCommand) -> Result<PostChange, AdminPostError> {
        let params = self.prepare(command, None).await?;
        let post = self.posts.create_post(params).await?;

        info!(
            target = "landing_news::application::admin::posts",
            post_id = post.id,
            languages = post.translations.len(),
            "Created post"
        );

        let invalidation = self.invalidation.invalidate(Invalidation::Post(&post)).await;
        Ok(PostChange { post, invalidation })
    }

    /// Replace a post. Cache entries are cleared for the stored version and,
    /// when the date or any slug moved, for the new one as well.
    pub async fn update_post(
        &self,
        id: i64,
        command: PostCommand,
    ) -> Result<PostChange, AdminPostError> {
        let before = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(AdminPostError::NotFound(id))?;
        let params = self.prepare(command, Some(id)).await?;
        let post = match self.posts.update_post(id, params).await {
            Ok(post) => post,
            Err(RepoError::NotFound) => return Err(AdminPostError::NotFound(id)),
            Err(err) => return Err(err.into()),
        };

        let mut invalidation = self.invalidation.invalidate(Invalidation::Post(&before)).await;
        if detail_identity_changed(self.localization.display_timezone(), &before, &post) {
            invalidation.merge(self.invalidation.invalidate(Invalidation::Post(&post)).await);
        }

        info!(
            target = "landing_news::application::admin::posts",
            post_id = post.id,
            "Updated post"
        );

        Ok(PostChange { post, invalidation })
    }

    pub async fn delete_post(&self, id: i64) -> Result<PostChange, AdminPostError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(AdminPostError::NotFound(id))?;
        match self.posts.delete_post(id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(AdminPostError::NotFound(id)),
            Err(err) => return Err(err.into()),
        }

        info!(
            target = "landing_news::application::admin::posts",
            post_id = id,
            "Deleted post"
        );

        let invalidation = self.invalidation.invalidate(Invalidation::Post(&post)).await;
        Ok(PostChange { post, invalidation })
    }

    async fn prepare(
        &self,
        command: PostCommand,
        exclude: Option<i64>,
    ) -> Result<PostWriteParams, AdminPostError> {
        ensure_non_empty(&command.author, "author")?;
        if command.translations.is_empty() {
            return Err(AdminPostError::ConstraintViolation("translations"));
        }

        let mut translations = BTreeMap::new();
        for (language, translation) in command.translations {
            if !self.localization.is_supported(&language) {
                return Err(AdminPostError::UnknownLanguage(language));
            }
            let translation = self
                .complete_translation(&language, translation, command.auto_meta, exclude)
                .await?;
            translations.insert(language, translation);
        }

        Ok(PostWriteParams {
            author: command.author.trim().to_string(),
            publish: command.publish,
            status: command.status,
            category_id: command.category_id,
            tag_ids: command.tag_ids,
            auto_meta: command.auto_meta,
            featured_image: command.featured_image.filter(|image| !image.trim().is_empty()),
            translations,
        })
    }

    async fn complete_translation(
        &self,
        language: &str,
        mut translation: PostTranslation,
        auto_meta: bool,
        exclude: Option<i64>,
    ) -> Result<PostTranslation, AdminPostError> {
        ensure_non_empty(&translation.title, "title")?;
        translation.title = translation.title.trim().to_string();

        translation.slug = if translation.slug.trim().is_empty() {
            self.unique_slug(language, &translation.title, exclude).await?
        } else {
            let slug = derive_slug(&translation.slug)
                .map_err(|_| AdminPostError::ConstraintViolation("slug"))?;
            if self.posts.slug_taken(language, &slug, exclude).await? {
                return Err(AdminPostError::SlugTaken {
                    language: language.to_string(),
                    slug,
                });
            }
            slug
        };

        if auto_meta && translation.meta_description.trim().is_empty() {
            translation.meta_description = text::meta_description_from_body(&translation.body);
        }

        Ok(translation)
    }

    async fn unique_slug(
        &self,
        language: &str,
        title: &str,
        exclude: Option<i64>,
    ) -> Result<String, AdminPostError> {
        let posts = self.posts.clone();
        let result = generate_unique_slug_async(title, move |candidate| {
            let posts = posts.clone();
            let language = language.to_string();
            let candidate = candidate.to_string();
            async move {
                posts
                    .slug_taken(&language, &candidate, exclude)
                    .await
                    .map(|taken| !taken)
            }
        })
        .await;

        match result {
            Ok(slug) => Ok(slug),
            Err(SlugAsyncError::Slug(SlugError::Exhausted { .. })) => {
                Err(AdminPostError::ConstraintViolation("slug"))
            }
            Err(SlugAsyncError::Slug(_)) => Err(AdminPostError::ConstraintViolation("title")),
            Err(SlugAsyncError::Predicate(err)) => Err(AdminPostError::Repo(err)),
        }
    }
}

/// Whether any `post_detail_*` key of `after` differs from those of `before`.
fn detail_identity_changed(tz: Tz, before: &PostRecord, after: &PostRecord) -> bool {
    display_date(before.publish, tz) != display_date(after.publish, tz)
        || before.translations.len() != after.translations.len()
        || before
            .translations
            .iter()
            .any(|(language, translation)| after.slug_for(language) != Some(translation.slug.as_str()))
}
