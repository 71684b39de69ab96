pub mod establishments;
pub mod geo;
pub mod models;

// Re-exports
pub use models::*;

use axum::{extract::State, routing::get, Json, Router};
use tracing::warn;

pub async fn health_handler(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let storage = match state.repository.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!(error = %e, "Storage ping failed");
            "unavailable"
        }
    };
    Json(models::HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: storage.to_string(),
    })
}

/// All API routes with state applied
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .merge(establishments::routes())
        .merge(geo::routes())
        .with_state(state)
}
