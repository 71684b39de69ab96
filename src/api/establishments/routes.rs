use crate::api::establishments::handlers::{
    create_handler, delete_handler, get_handler, list_handler, update_handler,
};
use crate::api::models::AppState;
use axum::{routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/establishments", get(list_handler).post(create_handler))
        .route(
            "/api/establishments/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
}
