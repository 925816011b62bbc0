//! Authorization code exchange
//!
//! Trades a callback `code` for an access token at the provider's token
//! endpoint, then fetches the user's profile with that token. Neither the
//! code nor the token is stored or logged; request spans record the path only.

use std::time::{Duration, Instant};

use reqwest::header::ACCEPT;
use serde::Deserialize;

use super::profile::UserProfile;
use super::provider::ProviderConfig;
use crate::error::{AppError, ProviderStage};
use crate::metrics::PROVIDER_REQUEST_DURATION_SECONDS;

/// Access token issued by a provider. Consumed by `fetch_profile`.
pub struct AccessToken(String);

impl AccessToken {
    #[cfg(test)]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// OAuth error codes meaning the authorization code itself is unusable
const INVALID_CODE_ERRORS: &[&str] = &["invalid_grant", "bad_verification_code"];

/// Token endpoint response
///
/// GitHub answers a bad code with 200 and an `error` field, so both shapes
/// are accepted here and sorted out in `exchange_code`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// HTTP client for provider interactions
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Create a client whose every request is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("oauthgate/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self { http_client })
    }

    /// Exchange an authorization code for a token, then fetch the profile
    pub async fn authenticate(
        &self,
        provider: &ProviderConfig,
        code: &str,
    ) -> Result<UserProfile, AppError> {
        let token = self.exchange_code(provider, code).await?;
        self.fetch_profile(provider, &token).await
    }

    /// Exchange authorization code for access token
    pub async fn exchange_code(
        &self,
        provider: &ProviderConfig,
        code: &str,
    ) -> Result<AccessToken, AppError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
            ("redirect_uri", provider.redirect_uri.as_str()),
        ];

        let started = Instant::now();
        let result = self
            .http_client
            .post(&provider.token_url)
            .header(ACCEPT, "application/json")
            .form(&params[..])
            .send()
            .await;
        observe(provider, ProviderStage::TokenExchange, started);
        let response = result?;

        let status = response.status();
        let body: Option<TokenResponse> = match response.json().await {
            Ok(body) => Some(body),
            Err(e) if e.is_timeout() => return Err(AppError::HttpClient(e)),
            Err(e) if status.is_success() => {
                return Err(AppError::ProviderResponse(format!(
                    "token response is not valid JSON: {e}"
                )));
            }
            Err(_) => None,
        };

        if let Some(error) = body.as_ref().and_then(|body| body.error.as_deref()) {
            tracing::warn!(
                provider = %provider.kind,
                status = status.as_u16(),
                error = %error,
                description = body
                    .as_ref()
                    .and_then(|body| body.error_description.as_deref())
                    .unwrap_or(""),
                "Token endpoint refused the authorization code"
            );
            if INVALID_CODE_ERRORS.contains(&error) {
                return Err(AppError::InvalidCode(error.to_string()));
            }
            return Err(AppError::ProviderRejected {
                stage: ProviderStage::TokenExchange,
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            tracing::warn!(
                provider = %provider.kind,
                status = status.as_u16(),
                "Token endpoint returned an error status"
            );
            return Err(AppError::ProviderRejected {
                stage: ProviderStage::TokenExchange,
                status: status.as_u16(),
            });
        }

        body.and_then(|body| body.access_token)
            .filter(|token| !token.is_empty())
            .map(AccessToken)
            .ok_or_else(|| {
                AppError::ProviderResponse("token response has no access_token".to_string())
            })
    }

    /// Get user info from provider
    pub async fn fetch_profile(
        &self,
        provider: &ProviderConfig,
        token: &AccessToken,
    ) -> Result<UserProfile, AppError> {
        let started = Instant::now();
        let result = self
            .http_client
            .get(&provider.userinfo_url)
            .header(ACCEPT, "application/json")
            .bearer_auth(token.secret())
            .send()
            .await;
        observe(provider, ProviderStage::Profile, started);
        let response = result?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                provider = %provider.kind,
                status = status.as_u16(),
                "Profile endpoint returned an error status"
            );
            return Err(AppError::ProviderRejected {
                stage: ProviderStage::Profile,
                status: status.as_u16(),
            });
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AppError::HttpClient(e)
            } else {
                AppError::ProviderResponse(format!("profile response is not valid JSON: {e}"))
            }
        })?;

        UserProfile::from_value(payload)
    }
}

fn observe(provider: &ProviderConfig, stage: ProviderStage, started: Instant) {
    let stage = match stage {
        ProviderStage::TokenExchange => "token",
        ProviderStage::Profile => "profile",
    };
    PROVIDER_REQUEST_DURATION_SECONDS
        .with_label_values(&[provider.kind.as_str(), stage])
        .observe(started.elapsed().as_secs_f64());
}
