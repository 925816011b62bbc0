//! OAuth flows
//!
//! Implements the OAuth 2.0 authorization code flow with Google and GitHub.

use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::provider::ProviderKind;
use super::session::{build_session_cookie, clear_session_cookie, create_session_token};
use crate::AppState;
use crate::error::AppError;
use crate::metrics::{LOGIN_REDIRECTS_TOTAL, LOGINS_TOTAL};

/// Create authentication router
///
/// Routes:
/// - POST /login - Redirect to Google
/// - GET /callback - Google callback
/// - POST /githubLogin - Redirect to GitHub
/// - GET /githubCallback - GitHub callback
/// - POST /logout - Logout
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(google_login))
        .route("/callback", get(google_callback))
        .route("/githubLogin", post(github_login))
        .route("/githubCallback", get(github_callback))
        .route("/logout", post(logout))
}

/// 302 Found, the status browsers expect from a consent redirect
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

// =============================================================================
// Authorization redirects
// =============================================================================

/// POST /login
async fn google_login(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    authorization_redirect(&state, ProviderKind::Google)
}

/// POST /githubLogin
async fn github_login(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    authorization_redirect(&state, ProviderKind::GitHub)
}

fn authorization_redirect(
    state: &AppState,
    kind: ProviderKind,
) -> Result<Response, AppError> {
    let url = state.providers.get(kind).authorization_url()?;

    tracing::debug!(provider = %kind, url = %url, "Redirecting to provider consent page");
    LOGIN_REDIRECTS_TOTAL.with_label_values(&[kind.as_str()]).inc();

    Ok(found(url.as_str()))
}

// =============================================================================
// Callbacks
// =============================================================================

/// Query parameters on the provider callback
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// Set instead of `code` when the user declines consent
    error: Option<String>,
}

/// GET /callback
async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    complete_login(&state, ProviderKind::Google, query, jar).await
}

/// GET /githubCallback
async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    complete_login(&state, ProviderKind::GitHub, query, jar).await
}

/// Handles the provider redirect back to us.
///
/// # Steps
/// 1. Reject provider-side errors and missing codes
/// 2. Exchange code for access token
/// 3. Fetch user profile
/// 4. Sign profile into a session token and set cookie
/// 5. Redirect to /user
async fn complete_login(
    state: &AppState,
    kind: ProviderKind,
    query: CallbackQuery,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let result = exchange_and_sign(state, kind, query).await;

    let outcome = if result.is_ok() { "success" } else { "failure" };
    LOGINS_TOTAL.with_label_values(&[kind.as_str(), outcome]).inc();

    let token = result?;
    let cookie = build_session_cookie(
        token,
        &state.config.auth,
        state.config.should_use_secure_cookies(),
    );

    Ok((jar.add(cookie), found("/user")).into_response())
}

async fn exchange_and_sign(
    state: &AppState,
    kind: ProviderKind,
    query: CallbackQuery,
) -> Result<String, AppError> {
    if let Some(error) = query.error {
        return Err(AppError::ProviderDenied(error));
    }

    let code = query
        .code
        .filter(|code| !code.trim().is_empty())
        .ok_or(AppError::MissingCode)?;

    let profile = state
        .oauth_client
        .authenticate(state.providers.get(kind), &code)
        .await?;

    tracing::info!(
        provider = %kind,
        user = profile.identifier().as_deref().unwrap_or("unknown"),
        "User signed in"
    );

    create_session_token(
        &profile,
        &state.config.auth.session_secret,
        state.config.auth.session_max_age,
    )
}

// =============================================================================
// Logout
// =============================================================================

/// POST /logout
///
/// Clears session cookie and redirects to the landing page.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (jar.add(clear_session_cookie(&state.config.auth)), found("/"))
}
