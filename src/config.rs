//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

use crate::auth::oauth::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Test mode: disables response compression
    pub test_mode: bool,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Authentication configuration (Google OAuth + sessions)
///
/// The secrets and the public URL are optional at the config layer so the
/// server can boot far enough to report exactly which of them are missing;
/// `Authenticator::new` requires all of them.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session secret key (32+ bytes)
    pub session_secret: Option<String>,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
    /// Public base URL of the app, used to build the OAuth callback URL
    /// (e.g., "https://app.example.com")
    pub public_url: Option<String>,
    pub google: GoogleOAuthConfig,
}

/// Google OAuth configuration
///
/// The endpoint URLs default to Google's and are overridable so tests can
/// point the flow at a stub provider.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleOAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (ANTEROOM_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.test_mode", false)?
            .set_default("database.path", "data/anteroom.db")?
            .set_default("auth.session_max_age", 604800)?
            .set_default("auth.google.auth_url", GOOGLE_AUTH_URL)?
            .set_default("auth.google.token_url", GOOGLE_TOKEN_URL)?
            .set_default("auth.google.userinfo_url", GOOGLE_USERINFO_URL)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (ANTEROOM_*)
            .add_source(
                Environment::with_prefix("ANTEROOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Whether session and OAuth-state cookies should carry the `Secure`
    /// attribute. True when the public URL is https or points at a
    /// non-local host.
    pub fn should_use_secure_cookies(&self) -> bool {
        let Some(public_url) = &self.auth.public_url else {
            return false;
        };
        let Ok(parsed) = url::Url::parse(public_url) else {
            return false;
        };
        if parsed.scheme().eq_ignore_ascii_case("https") {
            return true;
        }
        parsed
            .host_str()
            .map(|host| !is_local_host(host))
            .unwrap_or(false)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_SESSION_SECRET_BYTES: usize = 32;

        if let Some(secret) = &self.auth.session_secret {
            if secret.as_bytes().len() < MIN_SESSION_SECRET_BYTES {
                return Err(crate::error::AppError::Config(format!(
                    "auth.session_secret must be at least {} bytes",
                    MIN_SESSION_SECRET_BYTES
                )));
            }
        }

        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if let Some(public_url) = &self.auth.public_url {
            let parsed = url::Url::parse(public_url).map_err(|e| {
                crate::error::AppError::Config(format!(
                    "auth.public_url is not a valid absolute URL: {e}"
                ))
            })?;

            if !parsed.scheme().eq_ignore_ascii_case("https") {
                let host = parsed.host_str().unwrap_or_default();
                if is_local_host(host) {
                    tracing::warn!(
                        host = %host,
                        "Using insecure session cookies for local development"
                    );
                } else {
                    return Err(crate::error::AppError::Config(
                        "auth.public_url must use https for non-local hosts".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn is_local_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                test_mode: false,
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/anteroom-test.db"),
            },
            auth: AuthConfig {
                session_secret: Some("x".repeat(32)),
                session_max_age: 604_800,
                public_url: Some("http://localhost:3000".to_string()),
                google: GoogleOAuthConfig {
                    client_id: Some("google-client-id".to_string()),
                    client_secret: Some("google-client-secret".to_string()),
                    auth_url: GOOGLE_AUTH_URL.to_string(),
                    token_url: GOOGLE_TOKEN_URL.to_string(),
                    userinfo_url: GOOGLE_USERINFO_URL.to_string(),
                },
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_http_on_localhost() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert!(!config.should_use_secure_cookies());
    }

    #[test]
    fn validate_rejects_short_session_secret() {
        let mut config = valid_config();
        config.auth.session_secret = Some("short-secret".to_string());

        let error = config
            .validate()
            .expect_err("session secret shorter than 32 bytes must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.session_secret")
        ));
    }

    #[test]
    fn validate_rejects_nonpositive_session_max_age() {
        let mut config = valid_config();
        config.auth.session_max_age = 0;

        let error = config
            .validate()
            .expect_err("session max age of 0 must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.session_max_age")
        ));
    }

    #[test]
    fn validate_rejects_http_public_url_for_non_local_host() {
        let mut config = valid_config();
        config.auth.public_url = Some("http://app.example.com".to_string());

        let error = config
            .validate()
            .expect_err("public hosts must require https");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.public_url must use https")
        ));
    }

    #[test]
    fn validate_allows_missing_auth_values() {
        // Presence of the secrets is the authenticator's concern; the
        // config layer only checks the shape of what is provided.
        let mut config = valid_config();
        config.auth.session_secret = None;
        config.auth.public_url = None;
        config.auth.google.client_id = None;
        config.auth.google.client_secret = None;

        assert!(config.validate().is_ok());
        assert!(!config.should_use_secure_cookies());
    }

    #[test]
    fn secure_cookies_for_https_public_url() {
        let mut config = valid_config();
        config.auth.public_url = Some("https://app.example.com".to_string());

        assert!(config.validate().is_ok());
        assert!(config.should_use_secure_cookies());
    }
}
