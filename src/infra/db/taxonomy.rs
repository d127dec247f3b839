use async_trait::async_trait;

use crate::{
    application::repos::{RepoError, TaxonomyRepo},
    domain::entities::{CategoryRecord, TagRecord},
    domain::types::PostStatus,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TaxonomyRow {
    id: i64,
    name: String,
    slug: String,
    post_count: i64,
}

impl From<TaxonomyRow> for CategoryRecord {
    fn from(row: TaxonomyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            post_count: row.post_count,
        }
    }
}

impl From<TaxonomyRow> for TagRecord {
    fn from(row: TaxonomyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            post_count: row.post_count,
        }
    }
}

const TAG_COUNTS: &str = "SELECT t.id, t.name, t.slug, COUNT(p.id) AS post_count \
    FROM news_tags t \
    LEFT JOIN news_post_tags pt ON pt.tag_id = t.id \
    LEFT JOIN news_posts p ON p.id = pt.post_id AND p.status = $1 \
    GROUP BY t.id, t.name, t.slug ";

#[async_trait]
impl TaxonomyRepo for PostgresRepositories {
    async fn categories_with_counts(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TaxonomyRow>(
            "SELECT c.id, c.name, c.slug, COUNT(p.id) AS post_count \
             FROM news_categories c \
             INNER JOIN news_posts p ON p.category_id = c.id AND p.status = $1 \
             GROUP BY c.id, c.name, c.slug \
             HAVING COUNT(p.id) > 0 \
             ORDER BY post_count DESC, LOWER(c.name)",
        )
        .bind(PostStatus::Published)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CategoryRecord::from).collect())
    }

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        let sql = format!("{TAG_COUNTS} ORDER BY LOWER(t.name), t.slug");
        let rows = sqlx::query_as::<_, TaxonomyRow>(&sql)
            .bind(PostStatus::Published)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    async fn popular_tags(&self, limit: usize) -> Result<Vec<TagRecord>, RepoError> {
        let sql = format!(
            "{TAG_COUNTS} HAVING COUNT(p.id) > 0 ORDER BY post_count DESC, LOWER(t.name) LIMIT $2"
        );
        let rows = sqlx::query_as::<_, TaxonomyRow>(&sql)
            .bind(PostStatus::Published)
            .bind(Self::convert_limit(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    async fn find_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, TaxonomyRow>(
            "SELECT c.id, c.name, c.slug, \
                (SELECT COUNT(*) FROM news_posts p WHERE p.category_id = c.id AND p.status = $2) AS post_count \
             FROM news_categories c WHERE c.slug = $1",
        )
        .bind(slug)
        .bind(PostStatus::Published)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CategoryRecord::from))
    }

    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError> {
        let row = sqlx::query_as::<_, TaxonomyRow>(
            "SELECT t.id, t.name, t.slug, \
                (SELECT COUNT(*) FROM news_post_tags pt \
                 INNER JOIN news_posts p ON p.id = pt.post_id \
                 WHERE pt.tag_id = t.id AND p.status = $2) AS post_count \
             FROM news_tags t WHERE t.slug = $1",
        )
        .bind(slug)
        .bind(PostStatus::Published)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TagRecord::from))
    }

    async fn category_slug_taken(&self, slug: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM news_categories WHERE slug = $1)")
            .bind(slug)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn tag_slug_taken(&self, slug: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM news_tags WHERE slug = $1)")
            .bind(slug)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_category(&self, name: &str, slug: &str) -> Result<CategoryRecord, RepoError> {
        let row = sqlx::query_as::<_, TaxonomyRow>(
            "INSERT INTO news_categories (name, slug) VALUES ($1, $2) \
             RETURNING id, name, slug, 0::BIGINT AS post_count",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn create_tag(&self, name: &str, slug: &str) -> Result<TagRecord, RepoError> {
        let row = sqlx::query_as::<_, TaxonomyRow>(
            "INSERT INTO news_tags (name, slug) VALUES ($1, $2) \
             RETURNING id, name, slug, 0::BIGINT AS post_count",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
