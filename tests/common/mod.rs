//! Common test utilities for E2E tests

use anteroom::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::Layer;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance with the default test config
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server, adjusting the config before startup
    ///
    /// Used to point the OAuth endpoints at a stub server or to turn
    /// test mode off for compression tests.
    pub async fn with_config(adjust: impl FnOnce(&mut config::AppConfig)) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let mut config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                test_mode: true,
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            auth: config::AuthConfig {
                session_secret: Some("test-secret-key-32-bytes-long!!!".to_string()),
                session_max_age: 604800,
                public_url: Some("http://localhost:3000".to_string()),
                google: config::GoogleOAuthConfig {
                    client_id: Some("test-client-id".to_string()),
                    client_secret: Some("test-client-secret".to_string()),
                    auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                    token_url: "https://oauth2.googleapis.com/token".to_string(),
                    userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
                },
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };
        adjust(&mut config);

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Same composition as the binary: the trailing-slash rewrite
        // wraps the router so it runs before route matching.
        let app = anteroom::trailing_slash_layer().layer(anteroom::build_router(state.clone()));

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(
                listener,
                axum::ServiceExt::<axum::http::Request<axum::body::Body>>::into_make_service(app),
            )
            .await
            .unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Insert a user row directly into the database
    pub async fn seed_user(&self, email: &str) -> anteroom::data::User {
        use anteroom::data::{EntityId, User, UserStore};
        use chrono::Utc;

        let now = Utc::now();
        let user = User {
            id: EntityId::new().0,
            user_id: "100000000000000000001".to_string(),
            email: email.to_string(),
            password: String::new(),
            name: "Test User".to_string(),
            image: String::new(),
            provider: "google".to_string(),
            created_at: now,
            updated_at: now,
        };

        self.state
            .db
            .insert_user(&user)
            .await
            .unwrap()
            .expect("seeded user row returned")
    }

    /// Create a signed session cookie header value for the given user
    pub fn session_cookie(&self, user: &anteroom::data::User) -> String {
        use anteroom::auth::session::{SESSION_COOKIE, SessionPayload, create_session_token};

        let secret = self
            .state
            .config
            .auth
            .session_secret
            .as_deref()
            .expect("test config has a session secret");

        let token = create_session_token(&SessionPayload::for_user(user), secret)
            .expect("Failed to create test token");

        format!("{}={}", SESSION_COOKIE, token)
    }
}
