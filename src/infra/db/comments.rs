use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{CommentsRepo, NewComment, RepoError},
    domain::entities::CommentRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const COMMENT_COLUMNS: &str = "id, post_id, name, email, body, active, created_at";

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    name: String,
    email: String,
    body: String,
    active: bool,
    created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            name: row.name,
            email: row.email,
            body: row.body,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_active_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM news_comments \
             WHERE post_id = $1 AND active \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(post_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn create_comment(&self, comment: NewComment) -> Result<CommentRecord, RepoError> {
        let sql = format!(
            "INSERT INTO news_comments (post_id, name, email, body, active) \
             VALUES ($1, $2, $3, $4, FALSE) \
             RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment.post_id)
            .bind(&comment.name)
            .bind(&comment.email)
            .bind(&comment.body)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CommentRecord>, RepoError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM news_comments WHERE id = $1");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(CommentRecord::from))
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<CommentRecord, RepoError> {
        let sql = format!(
            "UPDATE news_comments SET active = $2 WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_comment(&self, id: i64) -> Result<CommentRecord, RepoError> {
        let sql = format!("DELETE FROM news_comments WHERE id = $1 RETURNING {COMMENT_COLUMNS}");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(row.into())
    }

    async fn distinct_post_ids(&self, comment_ids: &[i64]) -> Result<Vec<i64>, RepoError> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar(
            "SELECT DISTINCT post_id FROM news_comments WHERE id = ANY($1) ORDER BY post_id",
        )
        .bind(comment_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn bulk_set_active(&self, comment_ids: &[i64], active: bool) -> Result<u64, RepoError> {
        if comment_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("UPDATE news_comments SET active = $2 WHERE id = ANY($1)")
            .bind(comment_ids)
            .bind(active)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
