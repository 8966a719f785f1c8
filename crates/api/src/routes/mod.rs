//! API routes.

pub mod dashboard;
pub mod health;
pub mod pivot;
pub mod records;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use utm_core::limits::MAX_SNAPSHOT_BODY_BYTES;

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(dashboard::dashboard_handler))
        .route("/add-utm", post(records::add_handler))
        .route("/save-utm-data", post(records::save_handler))
        .route("/utm-data", get(records::list_handler))
        .route(
            "/pivot",
            get(pivot::refresh_handler).post(pivot::snapshot_handler),
        )
        .route("/pivot/current", get(pivot::current_handler))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .route("/metrics", get(health::metrics_handler))
        // Snapshots outgrow axum's 2MB default; handlers enforce their own limits.
        .layer(DefaultBodyLimit::max(MAX_SNAPSHOT_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
