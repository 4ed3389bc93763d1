//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::data::User;
use crate::error::AppError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Payload format version written into new tokens.
const SESSION_VERSION: u8 = 1;

/// Versioned session payload
///
/// Stored in a signed cookie. The user snapshot is taken at login and
/// never refreshed; a token with an unrecognized version reads as no
/// session, so the format can change without breaking old cookies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPayload {
    /// Payload format version
    #[serde(rename = "v")]
    pub version: u8,
    /// The signed-in user, if any
    pub user: Option<User>,
}

impl SessionPayload {
    /// Build the current-version payload for a signed-in user.
    pub fn for_user(user: &User) -> Self {
        Self {
            version: SESSION_VERSION,
            user: Some(user.clone()),
        }
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
///
/// # Arguments
/// * `payload` - Session payload to encode
/// * `secret` - HMAC secret key
///
/// # Returns
/// Signed token string
pub fn create_session_token(payload: &SessionPayload, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize payload to JSON
    let json = serde_json::to_string(payload).map_err(|e| AppError::Internal(e.into()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(json.as_bytes());

    // 3. Create HMAC-SHA256 signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// Any defect reads as no session rather than an error: a malformed
/// token, a bad signature, a payload that no longer deserializes, or a
/// version other than the current one.
///
/// # Arguments
/// * `token` - Token string to verify
/// * `secret` - HMAC secret key
///
/// # Returns
/// Decoded payload if the signature and version check out
pub fn verify_session_token(token: &str, secret: &str) -> Option<SessionPayload> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Split token into payload and signature
    let (payload_b64, signature_b64) = token.split_once('.')?;

    // 2. Verify HMAC signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload_b64.as_bytes());

    let signature = general_purpose::URL_SAFE_NO_PAD.decode(signature_b64).ok()?;
    mac.verify_slice(&signature).ok()?;

    // 3. Decode and deserialize payload
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let payload: SessionPayload = serde_json::from_slice(&payload_bytes).ok()?;

    // 4. Check the payload version
    if payload.version != SESSION_VERSION {
        return None;
    }

    Some(payload)
}

/// Cookie-backed session store
///
/// Wraps the token codec with the cookie read/write/clear operations
/// that handlers and middleware use. Cloned freely; holds only the
/// secret and cookie policy.
#[derive(Clone)]
pub struct SessionStore {
    secret: String,
    max_age_seconds: i64,
    secure: bool,
}

impl SessionStore {
    /// Build the store from auth configuration.
    ///
    /// # Errors
    /// Returns a config error if no session secret is set.
    pub fn new(auth: &AuthConfig, secure: bool) -> Result<Self, AppError> {
        let secret = auth
            .session_secret
            .clone()
            .ok_or_else(|| AppError::Config("auth.session_secret is not set".to_string()))?;

        Ok(Self {
            secret,
            max_age_seconds: auth.session_max_age,
            secure,
        })
    }

    /// Read the user snapshot from the request's session cookie.
    ///
    /// A missing cookie and an invalid token look the same: no user.
    pub fn read_user(&self, jar: &CookieJar) -> Option<User> {
        let cookie = jar.get(SESSION_COOKIE)?;
        verify_session_token(cookie.value(), &self.secret)?.user
    }

    /// Build the session cookie carrying the signed user snapshot.
    pub fn write_user(&self, user: &User) -> Result<Cookie<'static>, AppError> {
        let token = create_session_token(&SessionPayload::for_user(user), &self.secret)?;

        Ok(Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.max_age_seconds))
            .build())
    }

    /// Build the removal cookie that destroys the session.
    pub fn clear(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .build();
        cookie.make_removal();
        cookie
    }
}
