//! Request pipeline middleware
//!
//! The general-purpose stages of the middleware chain. Identity
//! resolution and the dashboard guard live in `auth::middleware`; the
//! chain is assembled in `build_router`, where the ordering is part of
//! the contract.

use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, Request, Uri, uri::PathAndQuery},
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::context::RequestContext;

/// Header stamped by the timing stage.
pub const X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

/// Rewrite the request path to its canonical no-trailing-slash form
///
/// Runs before routing: this function wraps the finished router via a
/// `MapRequestLayer` instead of being layered onto it, because router
/// layers only run after a route has already matched. The root path is
/// left alone.
pub fn normalize_trailing_slash(mut request: Request<axum::body::Body>) -> Request<axum::body::Body> {
    let path = request.uri().path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed };

        let path_and_query = match request.uri().query() {
            Some(query) => format!("{}?{}", trimmed, query),
            None => trimmed.to_string(),
        };

        if let Ok(path_and_query) = path_and_query.parse::<PathAndQuery>() {
            let mut parts = request.uri().clone().into_parts();
            parts.path_and_query = Some(path_and_query);
            if let Ok(uri) = Uri::from_parts(parts) {
                *request.uri_mut() = uri;
            }
        }
    }
    request
}

/// Middleware inserting the empty request context
///
/// Every stage and handler after this one can rely on the context
/// being present in the request extensions.
pub async fn bind_context(mut request: Request<axum::body::Body>, next: Next) -> Response {
    request.extensions_mut().insert(RequestContext::default());
    next.run(request).await
}

/// Middleware stamping `X-Response-Time` on every response
///
/// The value is whole milliseconds. Guard short-circuits and error
/// responses pass through here like any other response, so they carry
/// the header too.
pub async fn record_response_time(request: Request<axum::body::Body>, next: Next) -> Response {
    let started = Instant::now();
    let mut response = next.run(request).await;

    let elapsed_ms = started.elapsed().as_millis().to_string();
    if let Ok(value) = HeaderValue::from_str(&elapsed_ms) {
        response.headers_mut().insert(X_RESPONSE_TIME, value);
    }

    response
}

/// Middleware injecting the database handle into the request context
pub async fn inject_db(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(ctx) = request.extensions_mut().get_mut::<RequestContext>() {
        ctx.db = Some(state.db.clone());
    }
    next.run(request).await
}

/// Middleware guarding the API route group
///
/// Currently a plain passthrough; API token checks would slot in here.
pub async fn allow_api_request(request: Request<axum::body::Body>, next: Next) -> Response {
    next.run(request).await
}
