use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::repos::RepoError;
use crate::cache::InvalidationReport;
use crate::domain::entities::{PostRecord, PostTranslation};
use crate::domain::types::PostStatus;

#[derive(Debug, Error)]
pub enum AdminPostError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("language `{0}` is not configured")]
    UnknownLanguage(String),
    #[error("slug `{slug}` is already used in `{language}`")]
    SlugTaken { language: String, slug: String },
    #[error("post `{0}` not found")]
    NotFound(i64),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Body of the create and update endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PostCommand {
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub publish: OffsetDateTime,
    pub status: PostStatus,
    pub category_id: i64,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default = "default_auto_meta")]
    pub auto_meta: bool,
    #[serde(default)]
    pub featured_image: Option<String>,
    pub translations: BTreeMap<String, PostTranslation>,
}

fn default_auto_meta() -> bool {
    true
}

/// A stored post together with the cache keys its write invalidated.
#[derive(Debug, Clone, Serialize)]
pub struct PostChange {
    pub post: PostRecord,
    pub invalidation: InvalidationReport,
}

pub fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), AdminPostError> {
    if value.trim().is_empty() {
        Err(AdminPostError::ConstraintViolation(field))
    } else {
        Ok(())
    }
}
