use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use url::form_urlencoded;

use crate::{
    application::{
        error::HttpError,
        localization::ActiveLanguage,
        repos::ProductSort,
        shop::{CatalogPage, CatalogQuery},
    },
    domain::{entities::ProductRecord, types::ProductType},
    presentation::views::{
        FilterLinkView, LayoutContext, PagerView, ProductDetailView, ProductTemplate,
        ProductView, SelectOptionView, ShopTemplate, ShopView, product_type_label,
        render_template_response,
    },
};

use super::HttpState;

const SORT_OPTIONS: [(ProductSort, &str); 5] = [
    (ProductSort::Featured, "Destacados"),
    (ProductSort::PriceAsc, "Precio: menor a mayor"),
    (ProductSort::PriceDesc, "Precio: mayor a menor"),
    (ProductSort::Name, "Nombre"),
    (ProductSort::Newest, "Más recientes"),
];

fn product_view(
    state: &HttpState,
    language: &ActiveLanguage,
    product: &ProductRecord,
) -> ProductView {
    ProductView::new(
        product,
        state.path(language, &format!("/shop/product/{}/", product.slug)),
    )
}

/// Catalog link keeping the active filters; `category` and `page` override.
fn catalog_href(
    base: &str,
    catalog: &CatalogPage,
    category: Option<i64>,
    page: Option<u32>,
) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(category) = category {
        query.append_pair("category", &category.to_string());
    }
    if let Some(kind) = catalog.product_type {
        query.append_pair("type", kind.as_str());
    }
    if let Some(min) = catalog.min_price {
        query.append_pair("min_price", &min.to_string());
    }
    if let Some(max) = catalog.max_price {
        query.append_pair("max_price", &max.to_string());
    }
    if let Some(sort) = catalog.sort.as_query() {
        query.append_pair("sort", sort);
    }
    if let Some(page) = page {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}

pub(super) async fn catalog(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    Query(query): Query<CatalogQuery>,
) -> Result<Response, HttpError> {
    let catalog = state.shop.catalog(&query).await?;
    let base = state.path(&language, "/shop/");
    let selected = catalog.selected_category.as_ref().map(|category| category.id);

    let categories = catalog
        .categories
        .iter()
        .map(|category| FilterLinkView {
            label: category.name.clone(),
            href: catalog_href(&base, &catalog, Some(category.id), None),
            count: category.product_count,
            active: selected == Some(category.id),
        })
        .collect();
    let types = [ProductType::Physical, ProductType::Course, ProductType::Digital]
        .into_iter()
        .map(|kind| SelectOptionView {
            value: kind.as_str().to_string(),
            label: product_type_label(kind).to_string(),
            selected: catalog.product_type == Some(kind),
        })
        .collect();
    let sorts = SORT_OPTIONS
        .into_iter()
        .map(|(sort, label)| SelectOptionView {
            value: sort.as_query().unwrap_or_default().to_string(),
            label: label.to_string(),
            selected: catalog.sort == sort,
        })
        .collect();

    let content = ShopView {
        action: base.clone(),
        products: catalog
            .products
            .items
            .iter()
            .map(|product| product_view(&state, &language, product))
            .collect(),
        featured: catalog
            .featured
            .iter()
            .map(|product| product_view(&state, &language, product))
            .collect(),
        total_active: catalog.total_active,
        categories,
        types,
        sorts,
        min_price: catalog.min_price.map(|value| value.to_string()).unwrap_or_default(),
        max_price: catalog.max_price.map(|value| value.to_string()).unwrap_or_default(),
        pager: PagerView::from_page(&catalog.products, |number| {
            catalog_href(&base, &catalog, selected, Some(number))
        }),
    };
    let view = LayoutContext::new(state.chrome(&language, "/shop/", "Tienda"), content);
    Ok(render_template_response(ShopTemplate { view }, StatusCode::OK))
}

pub(super) async fn product(
    State(state): State<HttpState>,
    Extension(language): Extension<ActiveLanguage>,
    Path(slug): Path<String>,
) -> Result<Response, HttpError> {
    let detail = state.shop.product(&slug).await?;
    let content = ProductDetailView {
        product: product_view(&state, &language, &detail.product),
        related: detail
            .related
            .iter()
            .map(|product| product_view(&state, &language, product))
            .collect(),
        shop_href: state.path(&language, "/shop/"),
    };
    let path = format!("/shop/product/{slug}/");
    let chrome = state
        .chrome(&language, &path, &detail.product.name)
        .with_description(detail.product.description.chars().take(160).collect::<String>());
    let view = LayoutContext::new(chrome, content);
    Ok(render_template_response(
        ProductTemplate { view },
        StatusCode::OK,
    ))
}
