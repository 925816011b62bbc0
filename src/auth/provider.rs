//! OAuth provider definitions
//!
//! Static per-provider settings, built once at startup from `AppConfig`
//! and shared read-only through `AppState`.

use url::Url;

use crate::config::{AppConfig, ProviderSettings};
use crate::error::AppError;

/// Supported identity providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    GitHub,
}

impl ProviderKind {
    /// Lowercase name used in logs and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::GitHub => "github",
        }
    }

    fn default_authorize_url(&self) -> &'static str {
        match self {
            ProviderKind::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            ProviderKind::GitHub => "https://github.com/login/oauth/authorize",
        }
    }

    fn default_token_url(&self) -> &'static str {
        match self {
            ProviderKind::Google => "https://oauth2.googleapis.com/token",
            ProviderKind::GitHub => "https://github.com/login/oauth/access_token",
        }
    }

    fn default_userinfo_url(&self) -> &'static str {
        match self {
            ProviderKind::Google => "https://www.googleapis.com/oauth2/v3/userinfo",
            ProviderKind::GitHub => "https://api.github.com/user",
        }
    }

    fn default_scopes(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::Google => &[
                "https://www.googleapis.com/auth/userinfo.email",
                "https://www.googleapis.com/auth/userinfo.profile",
            ],
            ProviderKind::GitHub => &["user"],
        }
    }

    /// Path of our callback route for this provider
    pub fn callback_path(&self) -> &'static str {
        match self {
            ProviderKind::Google => "/callback",
            ProviderKind::GitHub => "/githubCallback",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved client configuration for one provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl ProviderConfig {
    /// Resolve settings against provider defaults
    pub fn from_settings(kind: ProviderKind, settings: &ProviderSettings, base_url: &str) -> Self {
        Self {
            kind,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_uri: settings
                .redirect_uri
                .clone()
                .unwrap_or_else(|| format!("{}{}", base_url, kind.callback_path())),
            scopes: settings.scopes.clone().unwrap_or_else(|| {
                kind.default_scopes()
                    .iter()
                    .map(|scope| scope.to_string())
                    .collect()
            }),
            authorize_url: settings
                .authorize_url
                .clone()
                .unwrap_or_else(|| kind.default_authorize_url().to_string()),
            token_url: settings
                .token_url
                .clone()
                .unwrap_or_else(|| kind.default_token_url().to_string()),
            userinfo_url: settings
                .userinfo_url
                .clone()
                .unwrap_or_else(|| kind.default_userinfo_url().to_string()),
        }
    }

    /// Build the consent page URL the browser is redirected to
    ///
    /// Google additionally gets `response_type=code` and `access_type=offline`.
    pub fn authorization_url(&self) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.authorize_url).map_err(|e| {
            AppError::Config(format!("{} authorize URL is invalid: {e}", self.kind))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("scope", &self.scopes.join(" "));

            if self.kind == ProviderKind::Google {
                query
                    .append_pair("response_type", "code")
                    .append_pair("access_type", "offline");
            }
        }

        Ok(url)
    }
}

/// Both configured providers
#[derive(Debug, Clone)]
pub struct Providers {
    pub google: ProviderConfig,
    pub github: ProviderConfig,
}

impl Providers {
    pub fn from_config(config: &AppConfig) -> Self {
        let base_url = config.server.base_url();
        Self {
            google: ProviderConfig::from_settings(ProviderKind::Google, &config.google, base_url),
            github: ProviderConfig::from_settings(ProviderKind::GitHub, &config.github, base_url),
        }
    }

    pub fn get(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Google => &self.google,
            ProviderKind::GitHub => &self.github,
        }
    }
}
