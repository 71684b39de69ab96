use crate::geo::{Coordinate, FallbackLocality, ReverseGeocoder, DEFAULT_RADIUS_METERS};
use crate::storage::{EstablishmentRepository, StorageError};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::error;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn EstablishmentRepository>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub fallback_locality: Arc<FallbackLocality>,
}

/// `lat`, `lng` and optional `radius` query parameters, parsed by hand so
/// that bad values produce JSON errors.
#[derive(Debug, Default, Deserialize)]
pub struct CoordinateQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
}

impl CoordinateQuery {
    pub fn coordinate(&self) -> Result<Coordinate, String> {
        let lat = parse_number("lat", self.lat.as_deref())?;
        let lng = parse_number("lng", self.lng.as_deref())?;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!("lat must be between -90 and 90, got {lat}"));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(format!("lng must be between -180 and 180, got {lng}"));
        }
        Ok(Coordinate::new(lat, lng))
    }

    pub fn radius(&self) -> Result<f64, String> {
        match self.radius.as_deref() {
            None => Ok(DEFAULT_RADIUS_METERS),
            Some(_) => parse_number("radius", self.radius.as_deref()),
        }
    }
}

fn parse_number(name: &str, raw: Option<&str>) -> Result<f64, String> {
    let raw = raw.ok_or_else(|| format!("Missing query parameter {name}"))?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("Query parameter {name} must be a number, got {raw:?}"))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Reverse geocoding response; always sent with 200
#[derive(Debug, Serialize)]
pub struct GeocodeResponse {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound,
    Internal(String),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidId(id) => AppError::BadRequest(format!("Invalid id: {id}")),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorResponse {
            error: status.to_string(),
            message,
        }))
        .into_response()
    }
}
