//! Profile API

use axum::{Json, Router, middleware, routing::get};
use serde::Serialize;

use crate::AppState;
use crate::auth::{CurrentUser, UserProfile, require_session_api};

/// Profile response body
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub msg: &'static str,
    pub user: UserProfile,
}

/// Create profile API router
///
/// Routes:
/// - GET /userApi - Signed-in profile as JSON (session required)
pub fn user_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/userApi", get(user_api))
        .route_layer(middleware::from_fn_with_state(state, require_session_api))
}

/// GET /userApi
async fn user_api(CurrentUser(profile): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse {
        msg: "success",
        user: profile,
    })
}
