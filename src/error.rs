//! Error types for oauthgate
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.
//! No error path leaves a request without a response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Which provider call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStage {
    TokenExchange,
    Profile,
}

impl std::fmt::Display for ProviderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderStage::TokenExchange => f.write_str("token exchange"),
            ProviderStage::Profile => f.write_str("profile fetch"),
        }
    }
}

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Callback arrived without an authorization code (400)
    #[error("Missing authorization code")]
    MissingCode,

    /// Provider says the authorization code is invalid, expired or reused (400)
    #[error("Invalid authorization code: {0}")]
    InvalidCode(String),

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// User or provider declined the authorization request (401)
    #[error("Authorization denied by provider: {0}")]
    ProviderDenied(String),

    /// No session cookie (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Session token failed verification (401)
    #[error("Invalid session")]
    InvalidSession,

    /// Provider answered with a non-success status or an error body (502)
    #[error("Provider rejected {stage} with status {status}")]
    ProviderRejected { stage: ProviderStage, status: u16 },

    /// Provider payload could not be used (502)
    #[error("Unexpected provider response: {0}")]
    ProviderResponse(String),

    /// HTTP client error (502, 504 on timeout)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signing key setup failure (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// HTTP status, client-safe message and metric label for this error
    pub fn parts(&self) -> (StatusCode, String, &'static str) {
        match self {
            AppError::MissingCode => (StatusCode::BAD_REQUEST, self.to_string(), "missing_code"),
            AppError::InvalidCode(_) => (
                StatusCode::BAD_REQUEST,
                "Invalid or expired authorization code".to_string(),
                "invalid_code",
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "validation"),
            AppError::ProviderDenied(_) => (
                StatusCode::UNAUTHORIZED,
                "Authorization was denied".to_string(),
                "provider_denied",
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), "unauthorized"),
            AppError::InvalidSession => (
                StatusCode::UNAUTHORIZED,
                self.to_string(),
                "invalid_session",
            ),
            AppError::ProviderRejected { stage, .. } => (
                StatusCode::BAD_GATEWAY,
                format!("Identity provider rejected the {stage}"),
                "provider_rejected",
            ),
            AppError::ProviderResponse(_) => (
                StatusCode::BAD_GATEWAY,
                "Identity provider returned an unexpected response".to_string(),
                "provider_response",
            ),
            AppError::HttpClient(e) if e.is_timeout() => (
                StatusCode::GATEWAY_TIMEOUT,
                "Identity provider timed out".to_string(),
                "provider_timeout",
            ),
            AppError::HttpClient(_) => (
                StatusCode::BAD_GATEWAY,
                "Identity provider is unreachable".to_string(),
                "http_client",
            ),
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server misconfigured".to_string(),
                "config",
            ),
            AppError::Encryption(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "encryption",
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "internal",
            ),
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body. The full error is only logged.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_message, error_type) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, error_type, "Request failed");
        } else {
            tracing::warn!(error = %self, error_type, "Request rejected");
        }

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
