//! Comment submission and moderation.
//!
//! New comments are stored inactive and only become visible once approved
//! through the admin API. Every write invalidates the owning post.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;

use crate::application::captcha::CaptchaStore;
use crate::application::repos::{CommentsRepo, NewComment, PostsRepo, RepoError};
use crate::application::validation::FieldErrors;
use crate::cache::{Invalidation, InvalidationCoordinator, InvalidationReport};
use crate::domain::entities::CommentRecord;

const LABELS: &[(&str, &str)] = &[
    ("name", "Nombre completo"),
    ("email", "Correo electrónico"),
    ("body", "Comentario"),
    ("captcha", "Captcha"),
];

/// Form fields posted to `/news/comment/ajax/`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    pub post_id: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Ingresa un nombre de hasta 50 caracteres."))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Ingresa un correo electrónico válido."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "El comentario no puede estar vacío."))]
    pub body: String,
    #[serde(default)]
    pub captcha_key: String,
    #[serde(default)]
    pub captcha_value: String,
    #[serde(default)]
    pub ajax: Option<String>,
}

impl CommentForm {
    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.body = self.body.trim().to_string();
        self
    }

    pub fn wants_json(&self) -> bool {
        self.ajax.as_deref() == Some("1")
    }
}

#[derive(Debug, Clone)]
pub enum CommentSubmission {
    Accepted { comment: CommentRecord },
    /// Unknown or unpublished post.
    PostNotFound,
    Invalid(FieldErrors),
}

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("comment `{0}` not found")]
    NotFound(i64),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Result of a moderation action.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationSummary {
    pub updated: u64,
    pub post_ids: Vec<i64>,
    pub invalidation: InvalidationReport,
}

#[derive(Clone)]
pub struct CommentService {
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    captcha: Arc<CaptchaStore>,
    invalidation: InvalidationCoordinator,
}

impl CommentService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        captcha: Arc<CaptchaStore>,
        invalidation: InvalidationCoordinator,
    ) -> Self {
        Self {
            posts,
            comments,
            captcha,
            invalidation,
        }
    }

    pub fn captcha(&self) -> &CaptchaStore {
        &self.captcha
    }

    pub async fn submit(&self, form: CommentForm) -> Result<CommentSubmission, CommentError> {
        let form = form.normalized();

        let mut errors = match form.validate() {
            Ok(()) => FieldErrors::default(),
            Err(report) => FieldErrors::from_validation(&report, LABELS),
        };
        if !self.captcha.verify(&form.captcha_key, &form.captcha_value) {
            errors.add("captcha", "Captcha", "El código de verificación es incorrecto.");
        }
        if !errors.is_empty() {
            return Ok(CommentSubmission::Invalid(errors));
        }

        let Ok(post_id) = form.post_id.trim().parse::<i64>() else {
            return Ok(CommentSubmission::PostNotFound);
        };
        let Some(post) = self
            .posts
            .find_by_id(post_id)
            .await?
            .filter(|post| post.is_published())
        else {
            return Ok(CommentSubmission::PostNotFound);
        };

        let comment = self
            .comments
            .create_comment(NewComment {
                post_id: post.id,
                name: form.name,
                email: form.email,
                body: form.body,
            })
            .await?;
        info!(
            target = "landing_news::application::comments",
            comment_id = comment.id,
            post_id = post.id,
            "Comment submitted for moderation"
        );

        self.invalidation
            .invalidate(Invalidation::Comment { post: &post })
            .await;

        Ok(CommentSubmission::Accepted { comment })
    }

    /// Approve or reject a batch. Affected posts are captured before the
    /// update and each one is invalidated exactly once.
    pub async fn moderate(
        &self,
        comment_ids: &[i64],
        active: bool,
    ) -> Result<ModerationSummary, CommentError> {
        let post_ids = self.comments.distinct_post_ids(comment_ids).await?;
        let updated = self.comments.bulk_set_active(comment_ids, active).await?;

        let mut invalidation = InvalidationReport::default();
        for post_id in &post_ids {
            invalidation.merge(self.invalidate_post(*post_id).await?);
        }

        info!(
            target = "landing_news::application::comments",
            updated,
            posts = post_ids.len(),
            active,
            "Comments moderated"
        );

        Ok(ModerationSummary {
            updated,
            post_ids,
            invalidation,
        })
    }

    pub async fn toggle(
        &self,
        comment_id: i64,
    ) -> Result<(CommentRecord, InvalidationReport), CommentError> {
        let current = self
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or(CommentError::NotFound(comment_id))?;
        let updated = self
            .comments
            .set_active(comment_id, !current.active)
            .await?;
        let report = self.invalidate_post(updated.post_id).await?;
        Ok((updated, report))
    }

    pub async fn delete(&self, comment_id: i64) -> Result<InvalidationReport, CommentError> {
        let deleted = match self.comments.delete_comment(comment_id).await {
            Ok(comment) => comment,
            Err(RepoError::NotFound) => return Err(CommentError::NotFound(comment_id)),
            Err(err) => return Err(err.into()),
        };
        self.invalidate_post(deleted.post_id).await
    }

    async fn invalidate_post(&self, post_id: i64) -> Result<InvalidationReport, CommentError> {
        match self.posts.find_by_id(post_id).await? {
            Some(post) => Ok(self
                .invalidation
                .invalidate(Invalidation::Comment { post: &post })
                .await),
            None => {
                warn!(
                    target = "landing_news::application::comments",
                    post_id, "Owning post vanished before invalidation"
                );
                Ok(InvalidationReport::default())
            }
        }
    }
}
