//! ZoneNet Console
//!
//! Main entry point for the console server.

use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zonenet::{
    state::{AppConfig, AppState},
    web_api,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zonenet=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ZoneNet console v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        stream_ws_base = %config.stream_ws_base,
        stream_api_base = %config.stream_api_base,
        max_retries = config.max_retries,
        retry_delay_ms = config.retry_delay_ms,
        poll_interval_ms = config.poll_interval_ms,
        poll_grace_polls = config.poll_grace_polls,
        zone_max_points = config.zone_max_points,
        "Configuration loaded"
    );

    // Initialize components
    let state = AppState::build(config)?;

    // Create router, with static file serving when a bundle is configured
    let mut app = web_api::create_router(state.clone());
    if let Some(static_dir) = &state.config.static_dir {
        let serve_dir = ServeDir::new(static_dir)
            .not_found_service(ServeFile::new(static_dir.join("index.html")));
        app = app.fallback_service(serve_dir);
        tracing::info!(static_dir = %static_dir.display(), "Static file serving enabled");
    }
    let app = app
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
