pub mod config;
pub mod error;
pub mod routes;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use config::Config;

/// Build the full application: API routes, body limit, CORS and the
/// optional static front-end.
pub fn app(config: &Config) -> Router {
    let mut app = routes::build_router();

    // Serve static files if configured
    if let Some(ref static_dir) = config.static_dir {
        tracing::info!("Serving static files from {}", static_dir.display());
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    app.layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(CorsLayer::permissive())
}

/// Run the web server until ctrl-c.
pub async fn run(config: Config) -> Result<()> {
    tracing::info!("Starting uncomment serve on {}", config.listen_addr);
    tracing::info!("Max body size: {} bytes", config.max_body_bytes);

    let app = app(&config);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
