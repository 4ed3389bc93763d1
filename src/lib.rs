//! Anteroom - a small server-side web app with Google sign-in
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HTTP Layer (Axum)                        │
//! │  - Pages (home, dashboard group)                            │
//! │  - Google sign-in routes                                    │
//! │  - API route group                                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Middleware Pipeline                        │
//! │  - Trailing-slash rewrite, trace, compression               │
//! │  - Request context, timing, db + identity injection         │
//! │  - Route-group guards                                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `auth`: Google OAuth flow, sessions, and auth middleware
//! - `config`: Configuration management
//! - `context`: Per-request context threaded through the pipeline
//! - `data`: Database layer
//! - `error`: Error types
//! - `middleware`: General-purpose pipeline stages
//! - `pages`: Page and API handlers

pub mod auth;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod middleware;
pub mod pages;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Google sign-in strategy
    pub authenticator: Arc<auth::Authenticator>,

    /// Cookie-backed session store
    pub sessions: Arc<auth::SessionStore>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Validate auth configuration and build the authenticator
    /// 3. Build the session store
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        // 2. Validate auth configuration and build the authenticator
        let authenticator = auth::Authenticator::new(&config.auth)?;
        tracing::info!("Authenticator configured");

        // 3. Build the session store
        let sessions = auth::SessionStore::new(&config.auth, config.should_use_secure_cookies())?;

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            authenticator: Arc::new(authenticator),
            sessions: Arc::new(sessions),
        })
    }
}

/// Build the Axum router with all routes and the ordered middleware chain.
///
/// This is shared by the binary and integration tests to keep route and
/// middleware composition consistent across environments. The chain
/// order is load-bearing: the context must exist before timing records
/// into it, the database before identity resolution, and identity
/// before the route-group guards. Trace and compression sit outside
/// all of that so every outcome, including guard short-circuits, is
/// logged and compressed the same way.
///
/// Trailing-slash normalization is not part of this router; it has to
/// run before route matching, so the binary and tests wrap the router
/// with [`trailing_slash_layer`].
pub fn build_router(state: AppState) -> axum::Router {
    use axum::middleware::{from_fn, from_fn_with_state};
    use axum::{Router, routing::get};
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let dashboard_routes = Router::new()
        .route("/", get(pages::dashboard))
        .route("/settings", get(pages::dashboard_settings))
        .fallback(pages::not_found)
        .layer(from_fn(auth::require_dashboard_user));

    let api_routes = Router::new()
        .route("/ping", get(pages::api_ping))
        .layer(from_fn(middleware::allow_api_request));

    let router = Router::new()
        .route("/", get(pages::home))
        .route("/health", get(health_check))
        .merge(auth::auth_router())
        .nest("/dashboard", dashboard_routes)
        .nest("/api", api_routes)
        .fallback(pages::not_found)
        .layer(from_fn_with_state(state.clone(), auth::resolve_identity))
        .layer(from_fn_with_state(state.clone(), middleware::inject_db))
        .layer(from_fn(middleware::record_response_time))
        .layer(from_fn(middleware::bind_context));

    // Response compression is switched off entirely in test mode.
    let router = if state.config.server.test_mode {
        router
    } else {
        router.layer(CompressionLayer::new())
    };

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Pre-routing layer that canonicalizes trailing slashes.
///
/// Router layers run after a route has matched, so the rewrite must
/// wrap the finished router. Serve the wrapped service via
/// `ServiceExt::into_make_service`.
pub fn trailing_slash_layer() -> tower::util::MapRequestLayer<
    fn(axum::http::Request<axum::body::Body>) -> axum::http::Request<axum::body::Body>,
> {
    tower::util::MapRequestLayer::new(middleware::normalize_trailing_slash)
}

async fn health_check() -> &'static str {
    "OK"
}
