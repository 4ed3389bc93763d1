//! Google OAuth authentication
//!
//! Handles:
//! - Google OAuth flow
//! - Session management
//! - Authentication middleware

mod authenticator;
mod middleware;
pub mod oauth;
mod routes;
pub mod session;

pub use authenticator::Authenticator;
pub use middleware::{LoginRedirect, SessionUser, require_dashboard_user, resolve_identity};
pub use routes::auth_router;
pub use session::{SessionStore, create_session_token, verify_session_token};
