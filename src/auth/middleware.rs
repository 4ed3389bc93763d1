//! Authentication middleware
//!
//! Resolves the session identity for every request and gates the
//! dashboard route group.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::context::RequestContext;
use crate::data::User;

/// Middleware that resolves the session user into the request context
///
/// Runs on every route and never short-circuits: a request without a
/// valid session cookie simply carries no identity. Route-group guards
/// downstream decide what that means.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let session_user = state.sessions.read_user(&jar);

    if let Some(user) = &session_user {
        tracing::debug!(user_id = %user.user_id, "session user resolved");
    }

    if let Some(ctx) = request.extensions_mut().get_mut::<RequestContext>() {
        ctx.session_user = session_user;
    }

    next.run(request).await
}

/// Middleware guarding the dashboard route group
///
/// Redirects to the home page when no verified identity is present.
/// Otherwise binds the user id into the context before the handler
/// runs, so handlers can rely on it being set.
///
/// # Usage
/// ```ignore
/// let dashboard_routes = Router::new()
///     .route("/", get(dashboard))
///     .layer(middleware::from_fn(require_dashboard_user));
/// ```
pub async fn require_dashboard_user(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let user_id = request
        .extensions()
        .get::<RequestContext>()
        .and_then(|ctx| ctx.session_user.as_ref())
        .map(|user| user.user_id.clone());

    let Some(user_id) = user_id else {
        return Redirect::to("/").into_response();
    };

    if let Some(ctx) = request.extensions_mut().get_mut::<RequestContext>() {
        ctx.user_id = Some(user_id);
    }

    next.run(request).await
}

/// Extractor for the signed-in user
///
/// Reads the identity that `resolve_identity` placed in the request
/// context. Rejects by sending the browser to the login page, which is
/// how a page that needs a user should treat an anonymous visitor.
///
/// # Usage
/// ```ignore
/// async fn handler(SessionUser(user): SessionUser) -> impl IntoResponse {
///     format!("Hello, {}", user.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionUser(pub User);

/// Rejection that sends the browser to the login page
#[derive(Debug)]
pub struct LoginRedirect;

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to("/login").into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.session_user.clone())
            .map(SessionUser)
            .ok_or(LoginRedirect)
    }
}
