//! API layer
//!
//! HTTP handlers for:
//! - HTML pages (landing, profile)
//! - Profile JSON API
//! - Metrics (Prometheus)

pub mod metrics;
mod pages;
mod user;

pub use metrics::metrics_router;
pub use pages::pages_router;
pub use user::{UserResponse, user_api_router};
