//! Router construction for the serving layer.

use std::time::Duration;

use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::web::admission;

/// Per-request timeout. Ranking is pure computation over the in-memory
/// snapshot, so anything slower than this is a bug, not load.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Creates the web server router.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/admission/similar", post(admission::similar_background))
        .route("/admission/target", post(admission::target_schools))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
