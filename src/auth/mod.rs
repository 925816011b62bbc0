//! Google and GitHub OAuth authentication
//!
//! Handles:
//! - Provider configuration and consent redirects
//! - Authorization code exchange
//! - Session tokens
//! - Authentication middleware

pub mod exchange;
mod middleware;
mod oauth;
pub mod profile;
pub mod provider;
pub mod session;

pub use exchange::OAuthClient;
pub use middleware::{
    CurrentUser, LOGIN_REQUIRED_LOCATION, require_session_api, require_session_page,
};
pub use oauth::auth_router;
pub use profile::UserProfile;
pub use provider::{ProviderConfig, ProviderKind, Providers};
pub use session::{create_session_token, verify_session_token};
