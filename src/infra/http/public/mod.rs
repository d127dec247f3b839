//! Public site: landing pages, news, shop and the small JSON helpers the
//! forms call.

mod landing;
mod news;
mod shop;

use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::{Path, State},
    http::{
        HeaderValue,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    application::{
        captcha::{self, CaptchaStore},
        comments::CommentService,
        contact::ContactService,
        error::HttpError,
        landing::LandingService,
        localization::{ActiveLanguage, Localization},
        news::NewsService,
        repos::HealthRepo,
        shop::ShopService,
    },
    presentation::views::LayoutChrome,
};

use super::{
    RouterState, db_health_response,
    middleware::{log_responses, render_error_pages, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub landing: Arc<LandingService>,
    pub contact: Arc<ContactService>,
    pub news: Arc<NewsService>,
    pub comments: Arc<CommentService>,
    pub shop: Arc<ShopService>,
    pub captcha: Arc<CaptchaStore>,
    pub localization: Arc<Localization>,
    pub health: Arc<dyn HealthRepo>,
}

impl HttpState {
    pub(super) fn chrome(&self, language: &ActiveLanguage, path: &str, title: &str) -> LayoutChrome {
        LayoutChrome::new(&self.localization, language.code(), path, title)
    }

    pub(super) fn path(&self, language: &ActiveLanguage, path: &str) -> String {
        self.localization.localized_path(language.code(), path)
    }
}

/// Routes served once per configured language.
fn localized_routes() -> Router<RouterState> {
    Router::new()
        .route("/", get(landing::home))
        .route("/reservar/", get(landing::reservation_form).post(landing::reserve))
        .route("/gracias/", get(landing::thanks))
        .route("/empresas/", get(landing::companies))
        .route("/feedback/", post(landing::feedback))
        .route("/contacto/", get(landing::contact_form).post(landing::contact))
        .route("/news/", get(news::list))
        .route("/news/tag/{slug}/", get(news::tag_list))
        .route("/news/category/{slug}/", get(news::category_list))
        .route("/news/{year}/{month}/{day}/{slug}/", get(news::detail))
        .route("/news/comment/ajax/", post(news::comment))
        .route("/refresh-captcha/", get(refresh_captcha))
        .route("/captcha/image/{key}/", get(captcha_image))
        .route("/shop/", get(shop::catalog))
        .route("/shop/product/{slug}/", get(shop::product))
        .route("/_health/db", get(public_health))
}

pub fn build_router(state: RouterState) -> Router<RouterState> {
    let localization = state.http.localization.clone();

    let mut router = localized_routes().layer(Extension(
        localization.active(localization.default_language()),
    ));
    for code in localization.prefixed_languages() {
        let language = localization.active(code);
        router = router
            .route(
                &format!("/{code}/"),
                get(landing::home).layer(Extension(language.clone())),
            )
            .nest(
                &format!("/{code}"),
                localized_routes().layer(Extension(language)),
            );
    }

    router
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            render_error_pages,
        ))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn fallback() -> Response {
    HttpError::not_found(
        "infra::http::public::fallback",
        "No route matches the request",
    )
    .into_response()
}

fn set_no_store(response: &mut Response) {
    let value = HeaderValue::from_static("no-store");
    response.headers_mut().insert(CACHE_CONTROL, value);
}

async fn refresh_captcha(State(state): State<HttpState>) -> Response {
    let ticket = state.captcha.ticket();
    let mut response = Json(json!({
        "success": true,
        "captcha_key": ticket.captcha_key,
        "captcha_image": ticket.captcha_image,
    }))
    .into_response();
    set_no_store(&mut response);
    response
}

async fn captcha_image(State(state): State<HttpState>, Path(key): Path<String>) -> Response {
    let Some(challenge) = state.captcha.challenge(&key) else {
        return HttpError::not_found(
            "infra::http::public::captcha_image",
            "Unknown or expired captcha",
        )
        .into_response();
    };
    let mut response = (
        [(CONTENT_TYPE, HeaderValue::from_static("image/svg+xml"))],
        captcha::render_svg(&challenge),
    )
        .into_response();
    set_no_store(&mut response);
    response
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.ping().await)
}
