use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics::histogram;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    application::{
        error::{ErrorReport, PublicErrorMessage},
        localization::Localization,
    },
    presentation::views::{LayoutChrome, render_error_page},
};

use super::{HttpState, METRIC_HTTP_REQUEST_MS};

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed = start.elapsed();

    histogram!(
        METRIC_HTTP_REQUEST_MS,
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .record(elapsed.as_secs_f64() * 1000.0);

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = elapsed.as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "landing_news::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "request failed",
            );
        } else {
            warn!(
                target = "landing_news::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "client request error",
            );
        }
    }

    response
}

/// Language of a public path: a known `/{code}` prefix, else the default.
fn language_for_path(localization: &Localization, path: &str) -> String {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    localization
        .prefixed_languages()
        .find(|code| *code == first)
        .unwrap_or(localization.default_language())
        .to_string()
}

/// Turn plain-text [`HttpError`](crate::application::error::HttpError)
/// responses into the HTML error page. JSON responses pass through.
pub async fn render_error_pages(
    State(state): State<HttpState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone());
    let language = language_for_path(&state.localization, request.uri().path());

    let mut response = next.run(request).await;
    let Some(PublicErrorMessage(message)) =
        response.extensions().get::<PublicErrorMessage>().copied()
    else {
        return response;
    };

    let status = response.status();
    let report = response.extensions_mut().remove::<ErrorReport>();
    let chrome = LayoutChrome::new(&state.localization, &language, "/", "Error");
    let mut page = render_error_page(chrome, status, message, request_id);
    if let Some(report) = report {
        report.attach(&mut page);
    }
    page
}
