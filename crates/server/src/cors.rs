//! Cross-origin policy: explicit origin allow-list, credentials enabled.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use shared::error::{ApiError, ErrorCode};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::app_state::AppState;

#[derive(Debug, Clone, Default)]
pub(crate) struct OriginAllowList {
    origins: Vec<HeaderValue>,
}

impl OriginAllowList {
    pub(crate) fn new(origins: &[String]) -> Self {
        let origins = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(error) => {
                    warn!(%origin, %error, "ignoring unparseable allowed origin");
                    None
                }
            })
            .collect();
        Self { origins }
    }

    pub(crate) fn allows(&self, origin: &HeaderValue) -> bool {
        self.origins.iter().any(|allowed| allowed == origin)
    }

    pub(crate) fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.origins.clone()))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
    }
}

/// Rejects requests whose `Origin` header is not allow-listed before they
/// reach a handler. Requests without an `Origin` header pass through.
pub(crate) async fn reject_disallowed_origin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        if !state.origins.allows(origin) {
            warn!(origin = ?origin, path = %request.uri().path(), "origin not allowed");
            return (
                StatusCode::FORBIDDEN,
                Json(ApiError::new(ErrorCode::Forbidden, "origin not allowed")),
            )
                .into_response();
        }
    }
    next.run(request).await
}
