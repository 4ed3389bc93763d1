//! Google OAuth client
//!
//! Implements the OAuth 2.0 authorization code flow with PKCE against
//! Google. The client covers the three wire interactions of the flow:
//! building the authorization URL, exchanging the callback code for
//! tokens, and fetching the userinfo profile.

use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EmptyExtraTokenFields,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, StandardTokenResponse, TokenResponse,
    TokenUrl,
    basic::{BasicClient, BasicTokenType},
};
use serde::{Deserialize, Serialize};

use crate::config::GoogleOAuthConfig;
use crate::error::AppError;

/// Google's OAuth 2.0 authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google's OAuth 2.0 token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google's OpenID Connect userinfo endpoint.
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Scopes requested at sign-in.
const GOOGLE_SCOPES: &[&str] = &["openid", "profile", "email"];

type GoogleTokenResponse = StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>;

/// Per-flow state generated when sign-in starts
///
/// Round-trips through a short-lived cookie while the user is at
/// Google: the CSRF token comes back as the `state` query parameter,
/// the PKCE verifier is needed for the token exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthState {
    /// CSRF token echoed back by the callback
    pub csrf_token: String,
    /// PKCE code verifier for the token exchange
    pub pkce_verifier: String,
}

/// Tokens returned by the code exchange
#[derive(Debug, Clone)]
pub struct GoogleTokens {
    /// Bearer token for the userinfo request
    pub access_token: String,
}

/// Normalized profile from the userinfo endpoint
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    /// Provider-assigned subject identifier
    pub id: String,
    /// Email addresses, primary first
    pub emails: Vec<String>,
    /// Display name
    pub display_name: String,
    /// Avatar URLs, primary first
    pub photos: Vec<String>,
}

impl GoogleProfile {
    /// Primary email address, if Google reported one.
    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }

    /// Primary avatar URL, if Google reported one.
    pub fn primary_photo(&self) -> Option<&str> {
        self.photos.first().map(String::as_str)
    }
}

/// Raw userinfo response (OpenID Connect claims)
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<UserInfoResponse> for GoogleProfile {
    fn from(info: UserInfoResponse) -> Self {
        Self {
            id: info.sub,
            emails: info.email.into_iter().collect(),
            display_name: info.name.unwrap_or_default(),
            photos: info.picture.into_iter().collect(),
        }
    }
}

/// Google OAuth client over validated endpoint URLs
///
/// URLs are parsed once at construction so the per-request calls
/// cannot fail on configuration.
#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    userinfo_url: String,
    redirect_url: RedirectUrl,
}

impl GoogleOAuthClient {
    /// Build a client from OAuth configuration
    ///
    /// # Arguments
    /// * `config` - Google OAuth settings (credentials and endpoints)
    /// * `redirect_url` - Absolute callback URL registered with Google
    ///
    /// # Errors
    /// Returns a config error if a credential is missing or a URL does
    /// not parse.
    pub fn new(config: &GoogleOAuthConfig, redirect_url: &str) -> Result<Self, AppError> {
        let client_id = config
            .client_id
            .clone()
            .ok_or_else(|| AppError::Config("auth.google.client_id is not set".to_string()))?;
        let client_secret = config
            .client_secret
            .clone()
            .ok_or_else(|| AppError::Config("auth.google.client_secret is not set".to_string()))?;

        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| AppError::Config(format!("invalid OAuth auth URL: {}", e)))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| AppError::Config(format!("invalid OAuth token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(redirect_url.to_string())
            .map_err(|e| AppError::Config(format!("invalid OAuth redirect URL: {}", e)))?;

        Ok(Self {
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            auth_url,
            token_url,
            userinfo_url: config.userinfo_url.clone(),
            redirect_url,
        })
    }

    /// Generate the authorization URL for the sign-in redirect
    ///
    /// # Returns
    /// The URL to send the browser to, plus the state that must survive
    /// until the callback.
    pub fn authorization_url(&self) -> (String, OAuthState) {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);
        for scope in GOOGLE_SCOPES {
            request = request.add_scope(Scope::new((*scope).to_string()));
        }

        let (auth_url, csrf_token) = request.url();

        let state = OAuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        };

        (auth_url.to_string(), state)
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Arguments
    /// * `code` - Authorization code from the callback query
    /// * `pkce_verifier` - Verifier generated when the flow started
    ///
    /// # Errors
    /// Returns a token-exchange error if Google rejects the code; the
    /// response detail is logged, not shown to the user.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<GoogleTokens, AppError> {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::TokenExchange(format!("HTTP client setup failed: {}", e)))?;

        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let token_response: GoogleTokenResponse = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&http_client)
            .await
            .map_err(|e| AppError::TokenExchange(format!("code exchange rejected: {}", e)))?;

        Ok(GoogleTokens {
            access_token: token_response.access_token().secret().clone(),
        })
    }

    /// Fetch the signed-in user's profile from the userinfo endpoint
    ///
    /// # Arguments
    /// * `access_token` - Bearer token from the code exchange
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, AppError> {
        let response = reqwest::Client::new()
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?;

        let info: UserInfoResponse = response.json().await?;
        Ok(info.into())
    }
}
