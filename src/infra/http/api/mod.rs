pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, post},
};

use crate::infra::http::RouterState;
use crate::infra::http::middleware::{log_responses, set_request_context};

/// Routes under `/admin/api`. Callers only mount this when a token is set.
pub fn build_api_router(state: RouterState) -> Router<RouterState> {
    let auth_state = state.api.clone();

    Router::new()
        .route("/admin/api/posts", post(handlers::create_post))
        .route(
            "/admin/api/posts/{id}",
            axum::routing::put(handlers::update_post).delete(handlers::delete_post),
        )
        .route("/admin/api/categories", post(handlers::create_category))
        .route("/admin/api/tags", post(handlers::create_tag))
        .route(
            "/admin/api/comments/moderate",
            post(handlers::moderate_comments),
        )
        .route(
            "/admin/api/comments/{id}/toggle",
            post(handlers::toggle_comment),
        )
        .route("/admin/api/comments/{id}", delete(handlers::delete_comment))
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::api_auth,
        ))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
