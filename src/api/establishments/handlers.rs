use crate::api::models::*;
use crate::storage::Record;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

pub async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<Record>>, AppError> {
    let records = state.repository.list().await?;
    info!(count = records.len(), "Listed establishments");
    Ok(Json(records))
}

pub async fn create_handler(
    State(state): State<AppState>,
    body: Result<Json<Record>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), AppError> {
    let Json(record) = body?;

    let created = state.repository.create(record).await?;
    info!(id = ?created.get("id"), "Establishment created");

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>, AppError> {
    state
        .repository
        .get(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Record>, JsonRejection>,
) -> Result<Json<Record>, AppError> {
    let Json(fields) = body?;
    let changed: Vec<String> = fields.keys().cloned().collect();

    let updated = state
        .repository
        .update(&id, fields)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(%id, ?changed, "Establishment updated");
    Ok(Json(updated))
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.repository.delete(&id).await? {
        return Err(AppError::NotFound);
    }

    info!(%id, "Establishment deleted");
    Ok(Json(MessageResponse {
        message: "Deleted".to_string(),
    }))
}
