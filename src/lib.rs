//! oauthgate - sign in with Google or GitHub, gated by a signed session cookie
//!
//! # Flow
//!
//! ```text
//! browser ──POST /login──────────▶ 302 provider consent page
//! provider ──GET /callback?code──▶ token exchange ─▶ profile fetch
//!                                   └─▶ sign profile ─▶ Set-Cookie ─▶ 302 /user
//! browser ──GET /user, /userApi──▶ session gate ─▶ handler
//! ```
//!
//! # Modules
//!
//! - `auth`: provider config, code exchange, session tokens, gate middleware
//! - `api`: HTML pages, profile API, metrics endpoint
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;

use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
///
/// Everything in here is built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Resolved Google and GitHub client settings
    pub providers: Arc<auth::Providers>,

    /// HTTP client for provider calls
    pub oauth_client: Arc<auth::OAuthClient>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let providers = auth::Providers::from_config(&config);
        let oauth_client = auth::OAuthClient::new(Duration::from_secs(
            config.http.provider_timeout_seconds,
        ))?;

        tracing::info!(
            google_redirect_uri = %providers.google.redirect_uri,
            github_redirect_uri = %providers.github.redirect_uri,
            "Providers configured"
        );

        if !config.should_use_secure_cookies() {
            tracing::warn!(
                base_url = %config.server.base_url(),
                "Using insecure session cookies; serve over https in production"
            );
        }

        Ok(Self {
            config: Arc::new(config),
            providers: Arc::new(providers),
            oauth_client: Arc::new(oauth_client),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::pages_router(state.clone()))
        .merge(api::user_api_router(state.clone()))
        .merge(auth::auth_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
        .merge(api::metrics_router())
}

/// Request span without the query string, which carries authorization codes
fn request_span(request: &axum::http::Request<axum::body::Body>) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

async fn health_check() -> &'static str {
    "OK"
}
