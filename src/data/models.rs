//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// A user created through OAuth sign-in
///
/// One row per email address. The row is created on the first login and
/// returned as-is on every later login; profile fields are not refreshed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    /// Provider-assigned user identifier (Google profile `sub`)
    pub user_id: String,
    /// Primary email from the OAuth profile; the unique lookup key
    pub email: String,
    /// Always empty for OAuth-created accounts
    pub password: String,
    /// Display name from the OAuth profile
    pub name: String,
    /// Avatar URL from the OAuth profile
    pub image: String,
    /// Authentication provider tag (e.g., "google")
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
