//! E2E tests for the Google and GitHub sign-in flows

mod common;

use common::{TestServer, location, set_cookie_header, set_cookie_value};
use reqwest::StatusCode;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

async fn mount_provider(
    server: &TestServer,
    provider: &str,
    token_response: ResponseTemplate,
    profile_response: ResponseTemplate,
) {
    Mock::given(method("POST"))
        .and(path(format!("/{provider}/token")))
        .respond_with(token_response)
        .mount(&server.provider)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{provider}/userinfo")))
        .respond_with(profile_response)
        .mount(&server.provider)
        .await;
}

#[tokio::test]
async fn test_google_login_redirects_to_consent_page() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/login"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = Url::parse(&location(&response)).expect("absolute URL");
    assert!(location.as_str().starts_with("https://accounts.google.com/"));
    assert_eq!(
        query_value(&location, "client_id").as_deref(),
        Some("google-client-id")
    );
    assert_eq!(
        query_value(&location, "redirect_uri").as_deref(),
        Some("http://localhost:3000/callback")
    );
    assert_eq!(query_value(&location, "access_type").as_deref(), Some("offline"));

    let scope = query_value(&location, "scope").expect("scope parameter");
    assert!(scope.contains("https://www.googleapis.com/auth/userinfo.email"));
    assert!(scope.contains("https://www.googleapis.com/auth/userinfo.profile"));
}

#[tokio::test]
async fn test_github_login_redirects_to_consent_page() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/githubLogin"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = Url::parse(&location(&response)).expect("absolute URL");
    assert!(
        location
            .as_str()
            .starts_with("https://github.com/login/oauth/authorize?")
    );
    assert_eq!(
        query_value(&location, "client_id").as_deref(),
        Some("github-client-id")
    );
    assert_eq!(query_value(&location, "scope").as_deref(), Some("user"));
}

#[tokio::test]
async fn test_login_requires_post() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/login"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_google_callback_sets_session_and_redirects_to_user() {
    let server = TestServer::new().await;

    Mock::given(method("POST"))
        .and(path("/google/token"))
        .and(body_string_contains("code=validcode"))
        .and(body_string_contains("client_id=google-client-id"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok1",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server.provider)
        .await;

    Mock::given(method("GET"))
        .and(path("/google/userinfo"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "a@b.com"})))
        .expect(1)
        .mount(&server.provider)
        .await;

    let response = server
        .client
        .get(server.url("/callback?code=validcode"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/user");

    let token = set_cookie_value(&response, "token").expect("session cookie set");
    let profile = oauthgate::auth::verify_session_token(&token, common::SESSION_SECRET)
        .expect("cookie carries a valid session");
    assert_eq!(profile.get("email"), Some(&json!("a@b.com")));

    let header = set_cookie_header(&response, "token").unwrap();
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("SameSite=Lax"));
    assert!(header.contains("Path=/"));
    assert!(!header.contains("Secure"));
    assert!(!header.contains("Max-Age"));
}

#[tokio::test]
async fn test_github_callback_sets_session_and_redirects_to_user() {
    let server = TestServer::new().await;

    Mock::given(method("POST"))
        .and(path("/github/token"))
        .and(header("accept", "application/json"))
        .and(body_string_contains("client_secret=github-client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "gho_abc",
            "token_type": "bearer",
            "scope": "user"
        })))
        .expect(1)
        .mount(&server.provider)
        .await;

    Mock::given(method("GET"))
        .and(path("/github/userinfo"))
        .and(header("authorization", "Bearer gho_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "octocat",
            "id": 583231,
            "name": "The Octocat"
        })))
        .expect(1)
        .mount(&server.provider)
        .await;

    let response = server
        .client
        .get(server.url("/githubCallback?code=goodcode"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/user");
    assert!(set_cookie_value(&response, "token").is_some());
}

#[tokio::test]
async fn test_github_callback_with_rejected_code_fails_fast() {
    let server = TestServer::new().await;
    mount_provider(
        &server,
        "github",
        ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
        ResponseTemplate::new(200).set_body_json(json!({"login": "never"})),
    )
    .await;

    let response = server
        .client
        .get(server.url("/githubCallback?code=badcode"))
        .send()
        .await
        .expect("request completes instead of hanging");

    assert!(
        response.status().is_client_error() || response.status().is_server_error(),
        "unexpected status {}",
        response.status()
    );
    assert!(set_cookie_value(&response, "token").is_none());

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_github_bad_verification_code_is_bad_request() {
    let server = TestServer::new().await;
    mount_provider(
        &server,
        "github",
        ResponseTemplate::new(200).set_body_json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        })),
        ResponseTemplate::new(200).set_body_json(json!({"login": "never"})),
    )
    .await;

    let response = server
        .client
        .get(server.url("/githubCallback?code=expired"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie_value(&response, "token").is_none());
}

#[tokio::test]
async fn test_google_invalid_grant_is_bad_request() {
    let server = TestServer::new().await;
    mount_provider(
        &server,
        "google",
        ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Bad Request"
        })),
        ResponseTemplate::new(200).set_body_json(json!({"email": "never@b.com"})),
    )
    .await;

    let response = server
        .client
        .get(server.url("/callback?code=reused"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie_value(&response, "token").is_none());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid or expired authorization code");
}

#[tokio::test]
async fn test_github_client_credential_error_is_bad_gateway() {
    let server = TestServer::new().await;
    mount_provider(
        &server,
        "github",
        ResponseTemplate::new(200).set_body_json(json!({
            "error": "incorrect_client_credentials",
            "error_description": "The client_id and/or client_secret passed are incorrect."
        })),
        ResponseTemplate::new(200).set_body_json(json!({"login": "never"})),
    )
    .await;

    let response = server
        .client
        .get(server.url("/githubCallback?code=goodcode"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(set_cookie_value(&response, "token").is_none());
}

#[tokio::test]
async fn test_unreachable_provider_is_bad_gateway() {
    let server = TestServer::with_config(|config| {
        config.google.token_url = Some("http://127.0.0.1:1/token".to_string());
    })
    .await;

    let response = server
        .client
        .get(server.url("/callback?code=validcode"))
        .send()
        .await
        .expect("request completes instead of hanging");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(set_cookie_header(&response, "token").is_none());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Identity provider is unreachable");
}

#[tokio::test]
async fn test_callback_without_code_is_bad_request() {
    let server = TestServer::new().await;

    for path in ["/callback", "/githubCallback", "/callback?code="] {
        let response = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "path {path}");
    }
}

#[tokio::test]
async fn test_callback_with_denied_consent_is_unauthorized() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/callback?error=access_denied"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_failure_is_bad_gateway() {
    let server = TestServer::new().await;
    mount_provider(
        &server,
        "google",
        ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok1"})),
        ResponseTemplate::new(500),
    )
    .await;

    let response = server
        .client
        .get(server.url("/callback?code=validcode"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_profile_without_identifier_is_bad_gateway() {
    let server = TestServer::new().await;
    mount_provider(
        &server,
        "google",
        ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok1"})),
        ResponseTemplate::new(200).set_body_json(json!({"name": "Nobody"})),
    )
    .await;

    let response = server
        .client
        .get(server.url("/callback?code=validcode"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(set_cookie_value(&response, "token").is_none());
}

#[tokio::test]
async fn test_hung_provider_times_out_with_gateway_timeout() {
    let server = TestServer::with_config(|config| {
        config.http.provider_timeout_seconds = 1;
    })
    .await;
    mount_provider(
        &server,
        "google",
        ResponseTemplate::new(200)
            .set_body_json(json!({"access_token": "tok1"}))
            .set_delay(std::time::Duration::from_secs(3)),
        ResponseTemplate::new(200).set_body_json(json!({"email": "a@b.com"})),
    )
    .await;

    let response = server
        .client
        .get(server.url("/callback?code=validcode"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_session_cookie_gets_secure_and_max_age_when_configured() {
    let server = TestServer::with_config(|config| {
        config.server.base_url = "https://login.example.com".to_string();
        config.auth.session_max_age = Some(3600);
    })
    .await;
    mount_provider(
        &server,
        "google",
        ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok1"})),
        ResponseTemplate::new(200).set_body_json(json!({"sub": "42"})),
    )
    .await;

    let response = server
        .client
        .get(server.url("/callback?code=validcode"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let header = set_cookie_header(&response, "token").expect("session cookie set");
    assert!(header.contains("Secure"));
    assert!(header.contains("Max-Age=3600"));
}

#[tokio::test]
async fn test_logout_clears_session_cookie() {
    let server = TestServer::new().await;
    let token = server.session_token(json!({"email": "a@b.com"}));

    let response = server
        .client
        .post(server.url("/logout"))
        .header("Cookie", format!("token={token}"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    let header = set_cookie_header(&response, "token").expect("removal cookie");
    assert!(header.starts_with("token=;"));
    assert!(header.contains("Max-Age=0"));
}
