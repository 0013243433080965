pub mod routes;

use crate::state::AppState;
use std::sync::Arc;

/// Read-only JSON API.
pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/api/dashboard", axum::routing::get(routes::get_dashboard))
        .route("/api/models", axum::routing::get(routes::get_models))
        .route("/api/performances", axum::routing::get(routes::get_performances))
        .route("/api/chart", axum::routing::get(routes::get_chart))
        .route("/api/counters", axum::routing::get(routes::get_counters))
        .route("/api/health", axum::routing::get(routes::get_health))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}
