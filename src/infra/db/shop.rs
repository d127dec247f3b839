use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{ProductFilter, ProductSort, ProductsRepo, RepoError},
    domain::entities::{ProductRecord, ShopCategoryRecord},
    domain::types::ProductType,
};

use super::{PostgresRepositories, map_sqlx_error};

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.slug, p.description, p.price, p.product_type, \
    p.category_id, c.name AS category_name, p.featured, p.active, p.display_order, p.created_at \
    FROM shop_products p \
    LEFT JOIN shop_categories c ON c.id = p.category_id ";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    slug: String,
    description: String,
    price: i64,
    product_type: ProductType,
    category_id: Option<i64>,
    category_name: Option<String>,
    featured: bool,
    active: bool,
    display_order: i32,
    created_at: OffsetDateTime,
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            product_type: row.product_type,
            category_id: row.category_id,
            category_name: row.category_name,
            featured: row.featured,
            active: row.active,
            display_order: row.display_order,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ShopCategoryRow {
    id: i64,
    name: String,
    slug: String,
    product_count: i64,
}

impl From<ShopCategoryRow> for ShopCategoryRecord {
    fn from(row: ShopCategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            product_count: row.product_count,
        }
    }
}

fn order_clause(sort: ProductSort) -> &'static str {
    match sort {
        ProductSort::PriceAsc => " ORDER BY p.price ASC, p.id",
        ProductSort::PriceDesc => " ORDER BY p.price DESC, p.id",
        ProductSort::Name => " ORDER BY LOWER(p.name) ASC, p.id",
        ProductSort::Newest => " ORDER BY p.created_at DESC, p.id DESC",
        ProductSort::Featured => {
            " ORDER BY p.featured DESC, p.display_order ASC, p.created_at DESC, p.id DESC"
        }
    }
}

impl PostgresRepositories {
    fn apply_product_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &ProductFilter) {
        qb.push(" WHERE p.active");
        if let Some(category_id) = filter.category_id {
            qb.push(" AND p.category_id = ");
            qb.push_bind(category_id);
        }
        if let Some(product_type) = filter.product_type {
            qb.push(" AND p.product_type = ");
            qb.push_bind(product_type);
        }
        if let Some(min_price) = filter.min_price {
            qb.push(" AND p.price >= ");
            qb.push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            qb.push(" AND p.price <= ");
            qb.push_bind(max_price);
        }
    }
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn count_products(&self, filter: &ProductFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop_products p");
        Self::apply_product_filter(&mut qb, filter);
        let count: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_SELECT);
        Self::apply_product_filter(&mut qb, filter);
        qb.push(order_clause(sort));
        qb.push(" LIMIT ");
        qb.push_bind(Self::convert_limit(limit));
        qb.push(" OFFSET ");
        qb.push_bind(Self::convert_limit(offset));

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }

    async fn categories_with_counts(&self) -> Result<Vec<ShopCategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ShopCategoryRow>(
            "SELECT c.id, c.name, c.slug, COUNT(p.id) AS product_count \
             FROM shop_categories c \
             LEFT JOIN shop_products p ON p.category_id = c.id AND p.active \
             WHERE c.active \
             GROUP BY c.id, c.name, c.slug, c.display_order \
             ORDER BY c.display_order, LOWER(c.name)",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(ShopCategoryRecord::from).collect())
    }

    async fn find_active_category(
        &self,
        id: i64,
    ) -> Result<Option<ShopCategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, ShopCategoryRow>(
            "SELECT c.id, c.name, c.slug, \
                (SELECT COUNT(*) FROM shop_products p WHERE p.category_id = c.id AND p.active) AS product_count \
             FROM shop_categories c \
             WHERE c.id = $1 AND c.active",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(ShopCategoryRecord::from))
    }

    async fn list_featured(&self, limit: usize) -> Result<Vec<ProductRecord>, RepoError> {
        let sql = format!(
            "{PRODUCT_SELECT} WHERE p.active AND p.featured \
             ORDER BY p.display_order ASC, p.created_at DESC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(Self::convert_limit(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }

    async fn find_active_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.active AND p.slug = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(ProductRecord::from))
    }

    async fn list_related(
        &self,
        product: &ProductRecord,
        limit: usize,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        let Some(category_id) = product.category_id else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "{PRODUCT_SELECT} WHERE p.active AND p.category_id = $1 AND p.id <> $2 \
             ORDER BY p.featured DESC, p.display_order ASC, p.created_at DESC LIMIT $3"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category_id)
            .bind(product.id)
            .bind(Self::convert_limit(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }
}
