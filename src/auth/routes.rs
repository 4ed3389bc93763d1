//! Google sign-in routes
//!
//! Routes:
//! - GET /login - Login page
//! - POST /auth/google - Redirect to Google
//! - GET /auth/google/callback - OAuth callback
//! - POST /logout - Logout

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use super::oauth::OAuthState;
use crate::AppState;
use crate::context::RequestContext;
use crate::error::AppError;

/// Cookie parking CSRF and PKCE state while the user is at Google.
const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// How long the parked state stays valid.
const OAUTH_STATE_MAX_AGE: time::Duration = time::Duration::minutes(10);

/// Create authentication router
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page))
        .route("/auth/google", post(google_start))
        .route("/auth/google/callback", get(google_callback))
        .route("/logout", post(logout))
}

// =============================================================================
// Login Page
// =============================================================================

/// GET /login
///
/// Renders a simple login page with the Google sign-in form.
async fn login_page() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>Sign in - Anteroom</title></head>
<body>
    <h1>Anteroom</h1>
    <form method="post" action="/auth/google">
        <button type="submit">Sign in with Google</button>
    </form>
</body>
</html>"#,
    )
}

// =============================================================================
// Google OAuth
// =============================================================================

/// POST /auth/google
///
/// Starts the sign-in flow.
///
/// # Steps
/// 1. Generate the authorization URL with fresh CSRF and PKCE state
/// 2. Park the state in a short-lived cookie
/// 3. Redirect the browser to Google
async fn google_start(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (auth_url, oauth_state) = state.authenticator.authorization_url();

    let state_json =
        serde_json::to_string(&oauth_state).map_err(|e| AppError::Internal(e.into()))?;

    let state_cookie = Cookie::build((OAUTH_STATE_COOKIE, state_json))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(OAUTH_STATE_MAX_AGE)
        .build();

    Ok((jar.add(state_cookie), Redirect::to(&auth_url)))
}

/// Query parameters from the Google callback
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    /// Authorization code
    code: String,
    /// CSRF state token
    state: String,
}

/// GET /auth/google/callback
///
/// Handles the OAuth callback from Google.
///
/// # Steps
/// 1. Recover the parked state and verify the CSRF token
/// 2. Exchange the code and resolve the local user
/// 3. Set the session cookie and drop the state cookie
/// 4. Redirect to the dashboard
async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    ctx: RequestContext,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let state_cookie = jar
        .get(OAUTH_STATE_COOKIE)
        .ok_or_else(|| AppError::OAuthState("state cookie is missing".to_string()))?;

    let oauth_state: OAuthState = serde_json::from_str(state_cookie.value())
        .map_err(|_| AppError::OAuthState("state cookie is unreadable".to_string()))?;

    if query.state != oauth_state.csrf_token {
        return Err(AppError::OAuthState("state token mismatch".to_string()));
    }

    let user = state
        .authenticator
        .authenticate(ctx.database()?, &query.code, &oauth_state.pkce_verifier)
        .await?;

    let session_cookie = state.sessions.write_user(&user)?;

    let mut stale_state = Cookie::build((OAUTH_STATE_COOKIE, ""))
        .path("/")
        .http_only(true)
        .build();
    stale_state.make_removal();

    Ok((
        jar.add(session_cookie).add(stale_state),
        Redirect::to("/dashboard"),
    ))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /logout
///
/// Clears the session cookie and redirects home. Safe to call without
/// a session; the outcome is the same.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (jar.add(state.sessions.clear()), Redirect::to("/"))
}
