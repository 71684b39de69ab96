use crate::api::geo::handlers::{geocode_handler, nearby_handler};
use crate::api::models::AppState;
use axum::{routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/geocode", get(geocode_handler))
        .route("/api/nearby", get(nearby_handler))
}
