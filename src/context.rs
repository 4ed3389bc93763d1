//! Request-scoped context
//!
//! The middleware chain fills this in and carries it in request
//! extensions; handlers extract it as an argument instead of reaching
//! for ambient state.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::data::{Database, User};
use crate::error::AppError;

/// Per-request bag populated by the middleware chain.
///
/// Inserted empty by the context-binding stage, then filled in by the
/// database-injection, identity-resolution, and guard stages. Discarded
/// with the request.
#[derive(Clone, Default)]
pub struct RequestContext {
    /// Database handle, injected for all downstream use
    pub db: Option<Arc<Database>>,
    /// Session user resolved from the request cookie, if any
    pub session_user: Option<User>,
    /// Identity bound by the dashboard guard for its handlers
    pub user_id: Option<String>,
}

impl RequestContext {
    /// Database handle injected by the middleware chain.
    pub fn database(&self) -> Result<&Database, AppError> {
        self.db.as_deref().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "database handle missing from request context"
            ))
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "request context was not bound by the middleware chain"
                ))
            })
    }
}
