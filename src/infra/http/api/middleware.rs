use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::error::ApiError;
use super::state::ApiState;

pub async fn api_auth(State(state): State<ApiState>, request: Request<Body>, next: Next) -> Response {
    let token = extract_token(request.headers().get(axum::http::header::AUTHORIZATION));

    let authorized = token.as_deref().is_some_and(|token| state.authorizes(token));
    if !authorized {
        warn!(
            target = "landing_news::api::auth",
            path = %request.uri().path(),
            token_present = token.is_some(),
            "rejected admin request"
        );
        return ApiError::unauthorized().into_response();
    }

    next.run(request).await
}

fn extract_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?;
    Some(bearer.trim().to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn only_bearer_tokens_are_extracted() {
        let bearer = HeaderValue::from_static("Bearer s3cret");
        let basic = HeaderValue::from_static("Basic czNjcmV0");
        assert_eq!(extract_token(Some(&bearer)).as_deref(), Some("s3cret"));
        assert_eq!(extract_token(Some(&basic)), None);
        assert_eq!(extract_token(None), None);
    }
}
