//! Login orchestration
//!
//! Drives a completed OAuth callback to a local user row: exchange the
//! code, fetch the profile, then look the user up by primary email or
//! create a fresh row.

use chrono::Utc;

use super::oauth::{GoogleOAuthClient, GoogleProfile, OAuthState};
use crate::config::AuthConfig;
use crate::data::{EntityId, User, UserStore};
use crate::error::AppError;

/// Provider tag stored on rows created here.
const PROVIDER_GOOGLE: &str = "google";

/// Google sign-in strategy
///
/// Construction validates the required auth settings, so a
/// misconfigured deployment fails at startup instead of on the first
/// login attempt.
#[derive(Debug)]
pub struct Authenticator {
    oauth: GoogleOAuthClient,
}

impl Authenticator {
    /// Validate configuration and build the OAuth client
    ///
    /// The callback URL is derived from the public URL, so it always
    /// matches what the start-of-flow redirect announces to Google.
    ///
    /// # Errors
    /// Returns a config error naming every missing value when the
    /// session secret, Google credentials, or public URL are absent.
    pub fn new(auth: &AuthConfig) -> Result<Self, AppError> {
        let mut missing = Vec::new();
        if auth.session_secret.is_none() {
            missing.push("auth.session_secret");
        }
        if auth.google.client_id.is_none() {
            missing.push("auth.google.client_id");
        }
        if auth.google.client_secret.is_none() {
            missing.push("auth.google.client_secret");
        }
        if auth.public_url.is_none() {
            missing.push("auth.public_url");
        }
        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "missing required auth configuration: {}",
                missing.join(", ")
            )));
        }

        let public_url = auth.public_url.as_deref().unwrap_or_default();
        let redirect_url = format!(
            "{}/auth/google/callback",
            public_url.trim_end_matches('/')
        );

        let oauth = GoogleOAuthClient::new(&auth.google, &redirect_url)?;
        Ok(Self { oauth })
    }

    /// Start the sign-in flow
    ///
    /// # Returns
    /// The Google authorization URL and the per-flow state to park in a
    /// cookie until the callback.
    pub fn authorization_url(&self) -> (String, OAuthState) {
        self.oauth.authorization_url()
    }

    /// Complete the sign-in flow for an OAuth callback
    ///
    /// # Steps
    /// 1. Exchange the code for an access token
    /// 2. Fetch the Google profile
    /// 3. Look up or create the local user row
    pub async fn authenticate(
        &self,
        users: &dyn UserStore,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<User, AppError> {
        let tokens = self.oauth.exchange_code(code, pkce_verifier).await?;
        let profile = self.oauth.fetch_profile(&tokens.access_token).await?;
        self.lookup_or_create(users, &profile).await
    }

    /// Return the row matching the profile's primary email, or insert one
    ///
    /// An existing row is returned exactly as stored; later profile
    /// changes at Google do not propagate into it.
    async fn lookup_or_create(
        &self,
        users: &dyn UserStore,
        profile: &GoogleProfile,
    ) -> Result<User, AppError> {
        let email = profile.primary_email().unwrap_or_default();

        if let Some(user) = users.find_user_by_email(email).await? {
            tracing::debug!(user_id = %user.user_id, "existing user signed in");
            return Ok(user);
        }

        let now = Utc::now();
        let user = User {
            id: EntityId::new().0,
            user_id: profile.id.clone(),
            email: email.to_string(),
            password: String::new(),
            name: profile.display_name.clone(),
            image: profile.primary_photo().unwrap_or_default().to_string(),
            provider: PROVIDER_GOOGLE.to_string(),
            created_at: now,
            updated_at: now,
        };

        let created = users
            .insert_user(&user)
            .await?
            .ok_or(AppError::UserCreate)?;

        tracing::info!(user_id = %created.user_id, "new user created");
        Ok(created)
    }
}
