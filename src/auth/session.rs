//! Session tokens
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.
//!
//! The payload is only base64-encoded, so anyone holding the cookie can read
//! the profile. The signature makes tampering detectable.

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::profile::UserProfile;
use crate::config::AuthConfig;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Signed part of the token
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// Provider profile, verbatim
    user: UserProfile,
    /// Issued at (unix seconds)
    iat: i64,
    /// Expiry (unix seconds); absent means the session never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

fn mac_for(secret: &str) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| AppError::Encryption(e.to_string()))
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
///
/// # Arguments
/// * `profile` - Profile to embed
/// * `secret` - HMAC secret key
/// * `max_age` - Lifetime in seconds, `None` for no expiry
pub fn create_session_token(
    profile: &UserProfile,
    secret: &str,
    max_age: Option<i64>,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let exp = max_age
        .map(|seconds| {
            now.checked_add(seconds).ok_or_else(|| {
                AppError::Config("auth.session_max_age is out of range".to_string())
            })
        })
        .transpose()?;
    let claims = SessionClaims {
        user: profile.clone(),
        iat: now,
        exp,
    };

    let payload = serde_json::to_vec(&claims).map_err(|e| AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload);

    let mut mac = mac_for(secret)?;
    mac.update(payload_b64.as_bytes());
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// `InvalidSession` if the token is malformed, the signature does not match,
/// or the token has expired
pub fn verify_session_token(token: &str, secret: &str) -> Result<UserProfile, AppError> {
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::InvalidSession)?;
    if signature_b64.contains('.') {
        return Err(AppError::InvalidSession);
    }

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::InvalidSession)?;

    let mut mac = mac_for(secret)?;
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AppError::InvalidSession)?;

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::InvalidSession)?;

    let claims: SessionClaims =
        serde_json::from_slice(&payload).map_err(|_| AppError::InvalidSession)?;

    if matches!(claims.exp, Some(exp) if exp <= Utc::now().timestamp()) {
        return Err(AppError::InvalidSession);
    }

    Ok(claims.user)
}

/// Cookie carrying a freshly issued session token
pub fn build_session_cookie(token: String, auth: &AuthConfig, secure: bool) -> Cookie<'static> {
    let mut builder = Cookie::build((auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);

    if let Some(max_age) = auth.session_max_age {
        builder = builder.max_age(time_duration(max_age));
    }

    builder.build()
}

/// Cookie that tells the browser to drop the session
pub fn clear_session_cookie(auth: &AuthConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build((auth.cookie_name.clone(), String::new()))
        .path("/")
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}

fn time_duration(seconds: i64) -> time::Duration {
    time::Duration::seconds(seconds)
}
