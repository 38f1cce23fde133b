//! Application bootstrapper
//!
//! Handles all initialization and setup for the pipewatch service.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, CONFIG};
use crate::endpoints;
use crate::state::AppState;

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    init_tracing();

    tracing::info!("Starting pipewatch v{}", CONFIG.version);
    log_configuration(&CONFIG);

    let state = AppState::with_process_runner(CONFIG.clone());
    let app = create_app(state);

    serve(app).await
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("pipewatch={},tower_http=info", CONFIG.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false))
        .init();
}

/// Report which optional integrations are active
fn log_configuration(config: &Config) {
    let enabled = |present: bool| if present { "configured" } else { "not configured" };

    tracing::info!(
        "GitHub repo: {}",
        config.github.repo.as_deref().unwrap_or("not configured")
    );
    tracing::info!("Jenkins: {}", enabled(config.jenkins.job_url().is_some()));
    tracing::info!(
        "Registry push: {}",
        enabled(config.registry.credentials().is_some())
    );
    tracing::info!(
        "Deployment target: {}/{}",
        config.kubernetes.namespace,
        config.kubernetes.deployment
    );
    tracing::info!(
        "Metrics backend: {}",
        enabled(config.monitoring.prometheus_url.is_some())
    );
}

/// CORS layer honoring `PIPEWATCH_ALLOWED_ORIGINS`
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    endpoints::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the HTTP server
async fn serve(app: Router) -> anyhow::Result<()> {
    let ip: std::net::IpAddr = CONFIG.server.host.parse()?;
    let addr = SocketAddr::from((ip, CONFIG.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
