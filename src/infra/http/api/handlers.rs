//! Admin JSON endpoints. Every write answers with the invalidation report
//! of the cache keys it touched.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use crate::application::admin::posts::PostCommand;
use crate::application::admin::taxonomy::TaxonomyCommand;

use super::error::ApiError;
use super::state::ApiState;

/// Upper bound on one bulk moderation request.
const MAX_MODERATION_BATCH: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ModerationRequest {
    pub comment_ids: Vec<i64>,
    pub active: bool,
}

pub async fn create_post(
    State(state): State<ApiState>,
    Json(command): Json<PostCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let change = state.posts.create_post(command).await?;
    Ok((StatusCode::CREATED, Json(change)))
}

pub async fn update_post(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(command): Json<PostCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let change = state.posts.update_post(id, command).await?;
    Ok(Json(change))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let change = state.posts.delete_post(id).await?;
    Ok(Json(json!({
        "deleted": change.post.id,
        "invalidation": change.invalidation,
    })))
}

pub async fn create_category(
    State(state): State<ApiState>,
    Json(command): Json<TaxonomyCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.taxonomy.create_category(command).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn create_tag(
    State(state): State<ApiState>,
    Json(command): Json<TaxonomyCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state.taxonomy.create_tag(command).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn moderate_comments(
    State(state): State<ApiState>,
    Json(request): Json<ModerationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.comment_ids.is_empty() {
        return Err(ApiError::bad_request("comment_ids must not be empty", None));
    }
    if request.comment_ids.len() > MAX_MODERATION_BATCH {
        return Err(ApiError::bad_request(
            "too many comments in one request",
            Some(format!("limit is {MAX_MODERATION_BATCH}")),
        ));
    }
    let summary = state
        .comments
        .moderate(&request.comment_ids, request.active)
        .await?;
    Ok(Json(summary))
}

pub async fn toggle_comment(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let (comment, invalidation) = state.comments.toggle(id).await?;
    Ok(Json(json!({
        "comment": comment,
        "invalidation": invalidation,
    })))
}

pub async fn delete_comment(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let invalidation = state.comments.delete(id).await?;
    Ok(Json(json!({
        "deleted": id,
        "invalidation": invalidation,
    })))
}
