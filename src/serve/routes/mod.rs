pub mod analyze;
pub mod batch;
pub mod download;
pub mod health;
pub mod languages;
pub mod process;
pub mod upload;

use axum::Router;
use axum::routing::{get, post};

/// Build the application router with all API routes.
pub fn build_router() -> Router {
    let api = Router::new()
        // Stripping
        .route("/process", post(process::process))
        .route("/process-file", post(process::process_file))
        .route("/process-multiple", post(batch::process_multiple))
        .route("/analyze", post(analyze::analyze))
        // Registry
        .route("/languages", get(languages::list))
        .route("/supported-languages", get(languages::supported));

    Router::new()
        .route("/health", get(health::health))
        .route("/remove_comments", post(download::download))
        .nest("/api", api)
}
