//! oauthgate binary entry point

use oauthgate::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load .env (if present)
/// 2. Load configuration from file and environment
/// 3. Initialize tracing/logging from the loaded configuration
/// 4. Initialize metrics and AppState
/// 5. Build Axum router
/// 6. Start HTTP server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Pick up a local .env if present
    let dotenv = dotenvy::dotenv();

    // 2. Load configuration
    let config = config::AppConfig::load()?;

    // 3. Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.default_filter().into());

    if config.logging.is_json() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Failed to read environment file"),
    }

    tracing::info!(base_url = %config.server.base_url(), "Starting oauthgate...");

    // 4. Initialize metrics and application state
    oauthgate::metrics::init_metrics();
    let state = AppState::new(config.clone())?;

    // 5. Build Axum router
    let app = oauthgate::build_router(state);

    // 6. Start HTTP server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
