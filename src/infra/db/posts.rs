use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;

use crate::{
    application::repos::{PostFilter, PostNeighbors, PostWriteParams, PostsRepo, RepoError},
    domain::entities::{CategoryRef, PostRecord, PostTranslation, TagRef},
    domain::types::PostStatus,
};

use super::{PostgresRepositories, map_sqlx_error};

const POST_SELECT: &str = "SELECT p.id, p.author, p.publish, p.status, p.category_id, \
    c.name AS category_name, c.slug AS category_slug, p.auto_meta, p.featured_image, \
    p.created_at, p.updated_at \
    FROM news_posts p \
    INNER JOIN news_categories c ON c.id = p.category_id ";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    author: String,
    publish: OffsetDateTime,
    status: PostStatus,
    category_id: i64,
    category_name: String,
    category_slug: String,
    auto_meta: bool,
    featured_image: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct TranslationRow {
    post_id: i64,
    language: String,
    title: String,
    slug: String,
    body: String,
    meta_description: String,
}

#[derive(sqlx::FromRow)]
struct PostTagRow {
    post_id: i64,
    id: i64,
    name: String,
    slug: String,
}

impl PostRow {
    fn into_record(
        self,
        translations: BTreeMap<String, PostTranslation>,
        tags: Vec<TagRef>,
    ) -> PostRecord {
        PostRecord {
            id: self.id,
            author: self.author,
            publish: self.publish,
            status: self.status,
            category: CategoryRef {
                id: self.category_id,
                name: self.category_name,
                slug: self.category_slug,
            },
            tags,
            auto_meta: self.auto_meta,
            featured_image: self.featured_image,
            translations,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// `%` and `_` in user input match literally.
pub(super) fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl PostgresRepositories {
    /// Attach translations and tags to bare post rows, keeping row order.
    async fn hydrate_posts(&self, rows: Vec<PostRow>) -> Result<Vec<PostRecord>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

        let translation_rows = sqlx::query_as::<_, TranslationRow>(
            "SELECT post_id, language, title, slug, body, meta_description \
             FROM news_post_translations WHERE post_id = ANY($1)",
        )
        .bind(ids.as_slice())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let tag_rows = sqlx::query_as::<_, PostTagRow>(
            "SELECT pt.post_id, t.id, t.name, t.slug \
             FROM news_post_tags pt \
             INNER JOIN news_tags t ON t.id = pt.tag_id \
             WHERE pt.post_id = ANY($1) \
             ORDER BY LOWER(t.name), t.slug",
        )
        .bind(ids.as_slice())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut translations: HashMap<i64, BTreeMap<String, PostTranslation>> = HashMap::new();
        for row in translation_rows {
            translations.entry(row.post_id).or_default().insert(
                row.language,
                PostTranslation {
                    title: row.title,
                    slug: row.slug,
                    body: row.body,
                    meta_description: row.meta_description,
                },
            );
        }

        let mut tags: HashMap<i64, Vec<TagRef>> = HashMap::new();
        for row in tag_rows {
            tags.entry(row.post_id).or_default().push(TagRef {
                id: row.id,
                name: row.name,
                slug: row.slug,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                row.into_record(
                    translations.remove(&id).unwrap_or_default(),
                    tags.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn fetch_one_published(
        &self,
        condition: &str,
        publish: OffsetDateTime,
        order: &str,
    ) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("{POST_SELECT} WHERE p.status = $1 AND {condition} ORDER BY {order} LIMIT 1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(PostStatus::Published)
            .bind(publish)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(self
            .hydrate_posts(row.into_iter().collect())
            .await?
            .into_iter()
            .next())
    }

    async fn write_children(
        tx: &mut Transaction<'_, Postgres>,
        post_id: i64,
        params: &PostWriteParams,
    ) -> Result<(), RepoError> {
        for (language, translation) in &params.translations {
            sqlx::query(
                "INSERT INTO news_post_translations \
                 (post_id, language, title, slug, body, meta_description) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(post_id)
            .bind(language)
            .bind(&translation.title)
            .bind(&translation.slug)
            .bind(&translation.body)
            .bind(&translation.meta_description)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        if !params.tag_ids.is_empty() {
            sqlx::query(
                "INSERT INTO news_post_tags (post_id, tag_id) \
                 SELECT $1, UNNEST($2::BIGINT[]) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(params.tag_ids.as_slice())
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        Ok(())
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(self
            .hydrate_posts(row.into_iter().collect())
            .await?
            .into_iter()
            .next())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<PostRecord>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("{POST_SELECT} WHERE p.id = ANY($1)");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(ids)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        self.hydrate_posts(rows).await
    }

    async fn list_published_ids(&self, filter: &PostFilter) -> Result<Vec<i64>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT p.id FROM news_posts p WHERE p.status = ");
        qb.push_bind(PostStatus::Published);

        if let Some(tag_id) = filter.tag_id {
            qb.push(
                " AND EXISTS (SELECT 1 FROM news_post_tags pt WHERE pt.post_id = p.id AND pt.tag_id = ",
            );
            qb.push_bind(tag_id);
            qb.push(")");
        }

        if let Some(category_id) = filter.category_id {
            qb.push(" AND p.category_id = ");
            qb.push_bind(category_id);
        }

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            qb.push(
                " AND EXISTS (SELECT 1 FROM news_post_translations tr WHERE tr.post_id = p.id AND tr.language = ",
            );
            qb.push_bind(filter.language.clone());
            qb.push(" AND (tr.title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR tr.body ILIKE ");
            qb.push_bind(pattern);
            qb.push("))");
        }

        qb.push(" ORDER BY p.publish DESC, p.id DESC");

        qb.build_query_scalar::<i64>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_published_in_window(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "{POST_SELECT} WHERE p.status = $1 AND p.publish >= $2 AND p.publish < $3 \
             ORDER BY p.publish DESC, p.id DESC"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(PostStatus::Published)
            .bind(start)
            .bind(end)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        self.hydrate_posts(rows).await
    }

    async fn list_similar(
        &self,
        post_id: i64,
        tag_ids: &[i64],
        limit: usize,
    ) -> Result<Vec<PostRecord>, RepoError> {
        if tag_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let ranked: Vec<i64> = sqlx::query_scalar(
            "SELECT p.id \
             FROM news_posts p \
             INNER JOIN news_post_tags pt ON pt.post_id = p.id \
             WHERE pt.tag_id = ANY($1) AND p.id <> $2 AND p.status = $3 \
             GROUP BY p.id, p.publish \
             ORDER BY COUNT(pt.tag_id) DESC, p.publish DESC \
             LIMIT $4",
        )
        .bind(tag_ids)
        .bind(post_id)
        .bind(PostStatus::Published)
        .bind(Self::convert_limit(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut posts = self.find_by_ids(&ranked).await?;
        posts.sort_by_key(|post| ranked.iter().position(|id| *id == post.id));
        Ok(posts)
    }

    async fn neighbors(&self, post: &PostRecord) -> Result<PostNeighbors, RepoError> {
        let previous = self
            .fetch_one_published("p.publish < $2", post.publish, "p.publish DESC, p.id DESC")
            .await?;
        let next = self
            .fetch_one_published("p.publish > $2", post.publish, "p.publish ASC, p.id ASC")
            .await?;
        Ok(PostNeighbors { previous, next })
    }

    async fn latest_published(&self, limit: usize) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!("{POST_SELECT} WHERE p.status = $1 ORDER BY p.publish DESC, p.id DESC LIMIT $2");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(PostStatus::Published)
            .bind(Self::convert_limit(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        self.hydrate_posts(rows).await
    }

    async fn slug_taken(
        &self,
        language: &str,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<bool, RepoError> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM news_post_translations \
                WHERE language = $1 AND slug = $2 AND ($3::BIGINT IS NULL OR post_id <> $3) \
             )",
        )
        .bind(language)
        .bind(slug)
        .bind(exclude)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_post(&self, params: PostWriteParams) -> Result<PostRecord, RepoError> {
        let mut tx = self.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO news_posts (author, publish, status, category_id, auto_meta, featured_image) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(&params.author)
        .bind(params.publish)
        .bind(params.status)
        .bind(params.category_id)
        .bind(params.auto_meta)
        .bind(params.featured_image.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        Self::write_children(&mut tx, id, &params).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        self.find_by_id(id).await?.ok_or(RepoError::NotFound)
    }

    async fn update_post(
        &self,
        id: i64,
        params: PostWriteParams,
    ) -> Result<PostRecord, RepoError> {
        let mut tx = self.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE news_posts \
             SET author = $2, publish = $3, status = $4, category_id = $5, auto_meta = $6, \
                 featured_image = $7, updated_at = now() \
             WHERE id = $1 \
             RETURNING id",
        )
        .bind(id)
        .bind(&params.author)
        .bind(params.publish)
        .bind(params.status)
        .bind(params.category_id)
        .bind(params.auto_meta)
        .bind(params.featured_image.as_deref())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        if updated.is_none() {
            return Err(RepoError::NotFound);
        }

        sqlx::query("DELETE FROM news_post_translations WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query("DELETE FROM news_post_tags WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        Self::write_children(&mut tx, id, &params).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        self.find_by_id(id).await?.ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM news_posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("teclado"), "%teclado%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }
}
