//! E2E tests for the middleware pipeline
//!
//! Covers route-group gating, the response-time header, the test-mode
//! compression switch, and trailing-slash normalization.

mod common;

use common::TestServer;

fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build no-redirect client")
}

#[tokio::test]
async fn test_dashboard_without_session_redirects_home() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    for path in ["/dashboard", "/dashboard/settings", "/dashboard/no-such-page"] {
        let response = client
            .get(server.url(path))
            .send()
            .await
            .expect("request succeeds");

        assert!(
            response.status().is_redirection(),
            "expected redirect for {path}"
        );
        let location = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .expect("location header");
        assert_eq!(location, "/", "expected home redirect for {path}");
    }
}

#[tokio::test]
async fn test_dashboard_with_invalid_session_redirects_home() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let response = client
        .get(server.url("/dashboard"))
        .header("Cookie", "session=not-a-valid-token")
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert_eq!(location, "/");
}

#[tokio::test]
async fn test_dashboard_with_session_shows_user_id() {
    let server = TestServer::new().await;
    let user = server.seed_user("dash@example.com").await;

    let response = server
        .client
        .get(server.url("/dashboard"))
        .header("Cookie", server.session_cookie(&user))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("response body");
    assert!(body.contains(&user.user_id));
}

#[tokio::test]
async fn test_dashboard_settings_with_session_shows_email() {
    let server = TestServer::new().await;
    let user = server.seed_user("settings@example.com").await;

    let response = server
        .client
        .get(server.url("/dashboard/settings"))
        .header("Cookie", server.session_cookie(&user))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("response body");
    assert!(body.contains("settings@example.com"));
}

#[tokio::test]
async fn test_dashboard_unknown_path_with_session_is_not_found() {
    let server = TestServer::new().await;
    let user = server.seed_user("missing@example.com").await;

    let response = server
        .client
        .get(server.url("/dashboard/no-such-page"))
        .header("Cookie", server.session_cookie(&user))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_response_time_header_on_every_outcome() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    // A page, the API group, a guard short-circuit, and a 404.
    for path in ["/", "/health", "/api/ping", "/dashboard", "/no-such-page"] {
        let response = client
            .get(server.url(path))
            .send()
            .await
            .expect("request succeeds");

        let value = response
            .headers()
            .get("x-response-time")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_else(|| panic!("missing X-Response-Time for {path}"));

        assert!(
            value.parse::<u128>().is_ok(),
            "X-Response-Time {value:?} for {path} is not whole milliseconds"
        );
    }
}

#[tokio::test]
async fn test_compression_disabled_in_test_mode() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/login"))
        .header("Accept-Encoding", "gzip, deflate")
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 200);
    assert!(
        response.headers().get("content-encoding").is_none(),
        "test mode must not compress"
    );
}

#[tokio::test]
async fn test_compression_enabled_outside_test_mode() {
    let server = TestServer::with_config(|config| config.server.test_mode = false).await;

    let response = server
        .client
        .get(server.url("/login"))
        .header("Accept-Encoding", "gzip")
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 200);
    let encoding = response
        .headers()
        .get("content-encoding")
        .and_then(|v| v.to_str().ok())
        .expect("content-encoding header");
    assert_eq!(encoding, "gzip");
}

#[tokio::test]
async fn test_trailing_slash_reaches_the_same_route() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    // Without the rewrite this would fall through to the 404 handler;
    // instead it behaves exactly like /dashboard and redirects home.
    let response = client
        .get(server.url("/dashboard/"))
        .send()
        .await
        .expect("request succeeds");
    assert!(response.status().is_redirection());

    let response = server
        .client
        .get(server.url("/login/"))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("response body");
    assert!(body.contains("Sign in with Google"));
}

#[tokio::test]
async fn test_api_ping_passes_the_group_guard() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/ping"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_path_returns_json_not_found() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/no-such-page"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.expect("response body"), "OK");
}
