//! HTML pages
//!
//! Rendered inline; every provider-supplied value is escaped.

use axum::{
    Router,
    extract::Query,
    middleware,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;

use crate::AppState;
use crate::auth::{CurrentUser, UserProfile, require_session_page};

/// Create page router
///
/// Routes:
/// - GET / - Landing page
/// - GET /user - Profile page (session required)
pub fn pages_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/user", get(user_page))
        .route_layer(middleware::from_fn_with_state(state, require_session_page));

    Router::new().route("/", get(landing_page)).merge(protected)
}

#[derive(Debug, Deserialize)]
struct LandingQuery {
    notice: Option<String>,
}

/// GET /
async fn landing_page(Query(query): Query<LandingQuery>) -> impl IntoResponse {
    let notice = match query.notice.as_deref() {
        Some("login_required") => r#"<p class="notice">Please log in first.</p>"#,
        _ => "",
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
    <h1>Sign in</h1>
    {notice}
    <form method="post" action="/login"><button type="submit">Sign in with Google</button></form>
    <form method="post" action="/githubLogin"><button type="submit">Sign in with GitHub</button></form>
</body>
</html>
"#
    ))
}

/// GET /user
async fn user_page(CurrentUser(profile): CurrentUser) -> impl IntoResponse {
    Html(render_user_page(&profile))
}

fn render_user_page(profile: &UserProfile) -> String {
    let greeting = profile
        .display_name()
        .map(|name| format!("Welcome, {}", html_escape::encode_text(name)))
        .unwrap_or_else(|| "Welcome".to_string());

    let rows: String = profile
        .fields()
        .iter()
        .map(|(key, value)| {
            format!(
                "        <tr><th>{}</th><td>{}</td></tr>\n",
                html_escape::encode_text(key),
                html_escape::encode_text(&display_value(value))
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Profile</title></head>
<body>
    <h1>{greeting}</h1>
    <p>success</p>
    <table>
{rows}    </table>
    <form method="post" action="/logout"><button type="submit">Log out</button></form>
</body>
</html>
"#
    )
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
