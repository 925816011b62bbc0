//! Authentication middleware
//!
//! Protects routes that require a session. HTML pages send the browser back
//! to the landing page; API routes answer 401 with a JSON error. A cookie that
//! fails verification is removed in both cases.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::profile::UserProfile;
use super::session::{clear_session_cookie, verify_session_token};
use crate::AppState;
use crate::error::AppError;
use crate::metrics::SESSION_VERIFICATIONS_TOTAL;

/// Where the page gate sends visitors without a valid session
pub const LOGIN_REQUIRED_LOCATION: &str = "/?notice=login_required";

fn authenticate(jar: &CookieJar, state: &AppState) -> Result<UserProfile, AppError> {
    let result = match jar.get(&state.config.auth.cookie_name) {
        None => Err(AppError::Unauthorized),
        Some(cookie) => verify_session_token(cookie.value(), &state.config.auth.session_secret),
    };

    let label = match &result {
        Ok(_) => "valid",
        Err(AppError::Unauthorized) => "missing",
        Err(_) => "invalid",
    };
    SESSION_VERIFICATIONS_TOTAL.with_label_values(&[label]).inc();

    result
}

/// Middleware for JSON routes
///
/// Adds the verified `UserProfile` to request extensions.
///
/// # Usage
/// ```ignore
/// let api_routes = Router::new()
///     .route("/userApi", get(user_api))
///     .route_layer(middleware::from_fn_with_state(state, require_session_api));
/// ```
pub async fn require_session_api(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&jar, &state) {
        Ok(profile) => {
            request.extensions_mut().insert(profile);
            next.run(request).await
        }
        Err(AppError::Unauthorized) => AppError::Unauthorized.into_response(),
        Err(error) => {
            let jar = jar.add(clear_session_cookie(&state.config.auth));
            (jar, error).into_response()
        }
    }
}

/// Middleware for HTML routes
///
/// Same check as `require_session_api`, but rejected visitors are redirected
/// to the landing page, which asks them to log in.
pub async fn require_session_page(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&jar, &state) {
        Ok(profile) => {
            request.extensions_mut().insert(profile);
            next.run(request).await
        }
        Err(AppError::Unauthorized) => Redirect::to(LOGIN_REQUIRED_LOCATION).into_response(),
        Err(error) => {
            tracing::warn!(error = %error, "Discarding session cookie");
            let jar = jar.add(clear_session_cookie(&state.config.auth));
            (jar, Redirect::to(LOGIN_REQUIRED_LOCATION)).into_response()
        }
    }
}

/// Extractor for current authenticated user
///
/// Only usable behind one of the session middlewares.
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentUser(profile): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {:?}", profile.display_name())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserProfile>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
