//! Page and API handlers
//!
//! The plain routes outside the sign-in flow: home, the dashboard
//! group, the API probe, and the not-found fallback.

use axum::{
    Json,
    response::{Html, IntoResponse},
};

use crate::auth::SessionUser;
use crate::context::RequestContext;
use crate::error::AppError;

/// GET /
///
/// Public home page; also where the dashboard guard and logout land.
pub async fn home() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>Anteroom</title></head>
<body>
    <h1>Anteroom</h1>
    <p><a href="/login">Sign in</a> or go to your <a href="/dashboard">dashboard</a>.</p>
</body>
</html>"#,
    )
}

/// GET /dashboard
///
/// Landing page for signed-in users. The route-group guard has already
/// bound the user id into the context; the extractor supplies the full
/// snapshot for display.
pub async fn dashboard(SessionUser(user): SessionUser, ctx: RequestContext) -> Html<String> {
    let user_id = ctx.user_id.unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Dashboard - Anteroom</title></head>
<body>
    <h1>Dashboard</h1>
    <p>Signed in as {} (user id {})</p>
    <p><a href="/dashboard/settings">Settings</a></p>
    <form method="post" action="/logout">
        <button type="submit">Sign out</button>
    </form>
</body>
</html>"#,
        html_escape::encode_text(&user.name),
        html_escape::encode_text(&user_id),
    ))
}

/// GET /dashboard/settings
///
/// Account details page for signed-in users.
pub async fn dashboard_settings(SessionUser(user): SessionUser) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Settings - Anteroom</title></head>
<body>
    <h1>Settings</h1>
    <ul>
        <li>Name: {}</li>
        <li>Email: {}</li>
        <li>Provider: {}</li>
    </ul>
    <p><a href="/dashboard">Back to dashboard</a></p>
</body>
</html>"#,
        html_escape::encode_text(&user.name),
        html_escape::encode_text(&user.email),
        html_escape::encode_text(&user.provider),
    ))
}

/// GET /api/ping
///
/// Liveness probe for the API route group.
pub async fn api_ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fallback for unmatched paths.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
