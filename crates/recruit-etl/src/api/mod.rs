pub mod response;

use crate::features::{self, FeatureState};
use crate::middleware;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

/// Application router: service info, health check and the versioned API
pub fn create_router(state: FeatureState) -> Router {
    let api_v1 = features::router(state);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .layer(middleware::tracing_layer())
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Recruitment ETL",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
