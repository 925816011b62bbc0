//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Login Metrics
    pub static ref LOGIN_REDIRECTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("oauthgate_login_redirects_total", "Total number of redirects to a provider consent page"),
        &["provider"]
    ).expect("metric can be created");
    pub static ref LOGINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("oauthgate_logins_total", "Total number of completed provider callbacks"),
        &["provider", "outcome"]
    ).expect("metric can be created");

    // Provider Metrics
    pub static ref PROVIDER_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "oauthgate_provider_request_duration_seconds",
            "Provider request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["provider", "stage"]
    ).expect("metric can be created");

    // Session Metrics
    pub static ref SESSION_VERIFICATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("oauthgate_session_verifications_total", "Total number of session cookie checks"),
        &["result"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("oauthgate_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
///
/// Calling it more than once is harmless; repeated registrations are skipped.
pub fn init_metrics() {
    let collectors: [(&str, Box<dyn prometheus::core::Collector>); 5] = [
        ("LOGIN_REDIRECTS_TOTAL", Box::new(LOGIN_REDIRECTS_TOTAL.clone())),
        ("LOGINS_TOTAL", Box::new(LOGINS_TOTAL.clone())),
        (
            "PROVIDER_REQUEST_DURATION_SECONDS",
            Box::new(PROVIDER_REQUEST_DURATION_SECONDS.clone()),
        ),
        (
            "SESSION_VERIFICATIONS_TOTAL",
            Box::new(SESSION_VERIFICATIONS_TOTAL.clone()),
        ),
        ("ERRORS_TOTAL", Box::new(ERRORS_TOTAL.clone())),
    ];

    for (name, collector) in collectors {
        match REGISTRY.register(collector) {
            Ok(()) => {}
            Err(prometheus::Error::AlreadyReg) => {
                tracing::debug!(metric = name, "Metric already registered");
            }
            Err(e) => tracing::error!(metric = name, error = %e, "Failed to register metric"),
        }
    }

    tracing::info!("Metrics registry initialized");
}
