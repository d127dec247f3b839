//! Read-only shop catalog.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::application::pagination::{Page, PageWindow, parse_page_number};
use crate::application::repos::{ProductFilter, ProductSort, ProductsRepo, RepoError};
use crate::domain::entities::{ProductRecord, ShopCategoryRecord};
use crate::domain::types::ProductType;

pub const PRODUCTS_PER_PAGE: usize = 12;
pub const FEATURED_LIMIT: usize = 3;
pub const RELATED_LIMIT: usize = 4;

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("product `{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// `GET /shop/` query; every field is optional and unparsable values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub products: Page<ProductRecord>,
    pub categories: Vec<ShopCategoryRecord>,
    pub selected_category: Option<ShopCategoryRecord>,
    pub product_type: Option<ProductType>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort: ProductSort,
    pub featured: Vec<ProductRecord>,
    pub total_active: u64,
}

#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: ProductRecord,
    pub related: Vec<ProductRecord>,
}

/// Prices arrive as free text; decimals are truncated to whole pesos.
fn parse_price(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|value| value.is_finite()).map(|value| value as i64))
}

#[derive(Clone)]
pub struct ShopService {
    products: Arc<dyn ProductsRepo>,
}

impl ShopService {
    pub fn new(products: Arc<dyn ProductsRepo>) -> Self {
        Self { products }
    }

    pub async fn catalog(&self, query: &CatalogQuery) -> Result<CatalogPage, ShopError> {
        let selected_category = match query
            .category
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
        {
            Some(id) => self.products.find_active_category(id).await?,
            None => None,
        };
        let product_type = query
            .product_type
            .as_deref()
            .and_then(|raw| ProductType::try_from(raw).ok());
        let min_price = parse_price(query.min_price.as_deref());
        let max_price = parse_price(query.max_price.as_deref());
        let sort = ProductSort::from_query(query.sort.as_deref());

        let filter = ProductFilter {
            category_id: selected_category.as_ref().map(|category| category.id),
            product_type,
            min_price,
            max_price,
        };
        let total = self.products.count_products(&filter).await?;
        let window = PageWindow::new(
            total,
            parse_page_number(query.page.as_deref()),
            PRODUCTS_PER_PAGE,
        );
        let items = self
            .products
            .list_products(&filter, sort, window.limit, window.offset)
            .await?;

        Ok(CatalogPage {
            products: window.into_page(items, total),
            categories: self.products.categories_with_counts().await?,
            selected_category,
            product_type,
            min_price,
            max_price,
            sort,
            featured: self.products.list_featured(FEATURED_LIMIT).await?,
            total_active: self.products.count_products(&ProductFilter::default()).await?,
        })
    }

    pub async fn product(&self, slug: &str) -> Result<ProductDetail, ShopError> {
        let product = self
            .products
            .find_active_by_slug(slug)
            .await?
            .ok_or_else(|| ShopError::NotFound(slug.to_string()))?;
        let related = if product.category_id.is_some() {
            self.products.list_related(&product, RELATED_LIMIT).await?
        } else {
            Vec::new()
        };
        Ok(ProductDetail { product, related })
    }
}
