//! Common test utilities for E2E tests

#![allow(dead_code)]

use oauthgate::auth::UserProfile;
use oauthgate::{AppState, config};
use tokio::net::TcpListener;
use wiremock::MockServer;

pub const SESSION_SECRET: &str = "test-secret-key-32-bytes-long!!!";

/// Test server instance
///
/// Token and profile endpoints point at `provider`, a wiremock server that
/// each test programs with the responses it needs.
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub provider: MockServer,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test configuration
    pub async fn with_config(customize: impl FnOnce(&mut config::AppConfig)) -> Self {
        let provider = MockServer::start().await;

        let mut config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                base_url: "http://localhost:3000".to_string(),
            },
            auth: config::AuthConfig {
                session_secret: SESSION_SECRET.to_string(),
                session_max_age: None,
                cookie_name: "token".to_string(),
            },
            google: provider_settings("google", &provider),
            github: provider_settings("github", &provider),
            http: config::HttpConfig {
                provider_timeout_seconds: 5,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };
        customize(&mut config);
        config.validate().expect("test config is valid");

        let state = AppState::new(config).unwrap();

        // Redirects are asserted on, never followed
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = oauthgate::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            provider,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Sign a profile the same way the callback does
    pub fn session_token(&self, profile: serde_json::Value) -> String {
        let profile = UserProfile::from_value(profile).expect("test profile is valid");
        oauthgate::auth::create_session_token(
            &profile,
            &self.state.config.auth.session_secret,
            self.state.config.auth.session_max_age,
        )
        .expect("Failed to create test token")
    }
}

/// Consent URLs keep their real defaults so redirect assertions stay
/// meaningful; token and profile calls go to the mock provider.
fn provider_settings(name: &str, provider: &MockServer) -> config::ProviderSettings {
    config::ProviderSettings {
        client_id: format!("{name}-client-id"),
        client_secret: format!("{name}-client-secret"),
        redirect_uri: None,
        scopes: None,
        authorize_url: None,
        token_url: Some(format!("{}/{name}/token", provider.uri())),
        userinfo_url: Some(format!("{}/{name}/userinfo", provider.uri())),
    }
}

/// Value of `name` from the response's Set-Cookie headers
pub fn set_cookie_value(response: &reqwest::Response, name: &str) -> Option<String> {
    set_cookie_header(response, name).and_then(|raw| {
        let pair = raw.split(';').next()?;
        let (_, value) = pair.split_once('=')?;
        Some(value.to_string())
    })
}

/// Full Set-Cookie header for `name`, attributes included
pub fn set_cookie_header(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|raw| raw.starts_with(&prefix))
        .map(ToString::to_string)
}

pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}
