//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Legacy flat environment variables (CLIENT_ID, JWT_SECRET, ...)
//! 4. Prefixed environment variables (override)

use serde::Deserialize;
use url::Url;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub google: ProviderSettings,
    pub github: ProviderSettings,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 3000)
    pub port: u16,
    /// Public URL the browser reaches us at (e.g., "https://login.example.com")
    ///
    /// Provider redirect URIs are derived from it.
    pub base_url: String,
}

impl ServerConfig {
    /// Public base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens (32+ bytes)
    pub session_secret: String,
    /// Session lifetime in seconds. Sessions never expire when unset.
    pub session_max_age: Option<i64>,
    /// Name of the cookie carrying the session token
    pub cookie_name: String,
}

/// Per-provider OAuth client settings
///
/// Only the credentials are required. Everything else falls back to the
/// provider's public endpoints and the default redirect path.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub client_id: String,
    pub client_secret: String,
    /// Overrides `{server.base_url}/<callback path>`
    pub redirect_uri: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub userinfo_url: Option<String>,
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Timeout applied to every token exchange and profile fetch
    pub provider_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub fn default_filter(&self) -> String {
        format!("oauthgate={},tower_http=debug", self.level)
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

/// Flat variable names used by earlier deployments, mapped onto config keys.
///
/// They are applied as defaults, so files and `OAUTHGATE__*` variables win.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("CLIENT_ID", "google.client_id"),
    ("SECRET_KEY", "google.client_secret"),
    ("SECRET_KEy", "google.client_secret"),
    ("GITHUB_CLIENT_ID", "github.client_id"),
    ("GITHUB_SECRET_KEY", "github.client_secret"),
    ("HOST", "server.base_url"),
    ("JWT_SECRET", "auth.session_secret"),
    ("PORT", "server.port"),
];

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. Legacy flat environment variables
    /// 3. config/default.toml (if exists)
    /// 4. config/local.toml (if exists)
    /// 5. Environment variables (OAUTHGATE__*)
    ///
    /// # Errors
    /// Returns error if configuration is missing or invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.base_url", "http://localhost:3000")?
            .set_default("auth.cookie_name", "token")?
            .set_default("http.provider_timeout_seconds", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?;

        for (var, key) in LEGACY_ENV_KEYS {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_default(*key, value)?;
            }
        }

        let config = builder
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("OAUTHGATE")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("google.scopes")
                    .with_list_parse_key("github.scopes"),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Session cookies get the `Secure` attribute when served over https
    pub fn should_use_secure_cookies(&self) -> bool {
        Url::parse(self.server.base_url())
            .map(|url| url.scheme() == "https")
            .unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        const MIN_SESSION_SECRET_BYTES: usize = 32;
        const MAX_SESSION_AGE_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

        if self.auth.session_secret.len() < MIN_SESSION_SECRET_BYTES {
            return Err(AppError::Config(format!(
                "auth.session_secret must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        if matches!(self.auth.session_max_age, Some(max_age) if max_age <= 0) {
            return Err(AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }
        if matches!(self.auth.session_max_age, Some(max_age) if max_age > MAX_SESSION_AGE_SECONDS)
        {
            return Err(AppError::Config(format!(
                "auth.session_max_age must be at most {} seconds",
                MAX_SESSION_AGE_SECONDS
            )));
        }

        if self.auth.cookie_name.trim().is_empty() {
            return Err(AppError::Config(
                "auth.cookie_name must not be empty".to_string(),
            ));
        }

        if self.http.provider_timeout_seconds == 0 {
            return Err(AppError::Config(
                "http.provider_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        let base_url = Url::parse(self.server.base_url())
            .map_err(|e| AppError::Config(format!("server.base_url is not a valid URL: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AppError::Config(
                "server.base_url must use http or https".to_string(),
            ));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(AppError::Config(format!(
                "logging.level must be one of trace, debug, info, warn, error (got {})",
                self.logging.level
            )));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(AppError::Config(
                "logging.format must be \"pretty\" or \"json\"".to_string(),
            ));
        }

        validate_provider("google", &self.google)?;
        validate_provider("github", &self.github)?;

        Ok(())
    }
}

fn validate_provider(name: &str, settings: &ProviderSettings) -> Result<(), crate::error::AppError> {
    use crate::error::AppError;

    if settings.client_id.trim().is_empty() {
        return Err(AppError::Config(format!("{name}.client_id must not be empty")));
    }
    if settings.client_secret.trim().is_empty() {
        return Err(AppError::Config(format!(
            "{name}.client_secret must not be empty"
        )));
    }

    let urls = [
        ("redirect_uri", &settings.redirect_uri),
        ("authorize_url", &settings.authorize_url),
        ("token_url", &settings.token_url),
        ("userinfo_url", &settings.userinfo_url),
    ];
    for (field, value) in urls {
        if let Some(value) = value {
            Url::parse(value).map_err(|e| {
                AppError::Config(format!("{name}.{field} is not a valid URL: {e}"))
            })?;
        }
    }

    Ok(())
}
