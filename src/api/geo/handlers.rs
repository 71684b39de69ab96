use crate::api::models::*;
use crate::geo::{self, display_address};
use crate::storage::Record;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use tracing::{info, warn};

/// Reverse geocode a point. Always answers 200; failures degrade to a fallback address.
pub async fn geocode_handler(
    State(state): State<AppState>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> Json<GeocodeResponse> {
    let fallback = &state.fallback_locality;

    let point = match query
        .map_err(|rejection| rejection.body_text())
        .and_then(|Query(q)| q.coordinate())
    {
        Ok(point) => point,
        Err(msg) => {
            warn!(error = %msg, "Geocode request without usable coordinates");
            return Json(GeocodeResponse {
                address: fallback.city.clone(),
                lat: None,
                lng: None,
                raw: None,
                error: Some(msg),
            });
        }
    };

    match state.geocoder.reverse(point).await {
        Ok(lookup) => {
            let address = display_address(&lookup, point, fallback);
            info!(lat = point.lat, lng = point.lng, %address, "Reverse geocoded");
            Json(GeocodeResponse {
                address,
                lat: Some(point.lat),
                lng: Some(point.lng),
                raw: Some(lookup.address),
                error: None,
            })
        }
        Err(e) => {
            warn!(lat = point.lat, lng = point.lng, error = %e, "Reverse geocoding degraded");
            Json(GeocodeResponse {
                address: fallback.describe(point),
                lat: Some(point.lat),
                lng: Some(point.lng),
                raw: None,
                error: Some(e.to_string()),
            })
        }
    }
}

/// Establishments within `radius` meters (default 5000), nearest first.
pub async fn nearby_handler(
    State(state): State<AppState>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> Result<Json<Vec<Record>>, AppError> {
    let Query(query) = query?;
    let origin = query.coordinate().map_err(AppError::BadRequest)?;
    let radius = query.radius().map_err(AppError::BadRequest)?;

    let records = state.repository.list().await?;
    let scanned = records.len();
    let found = geo::nearby(records, origin, radius);

    info!(
        lat = origin.lat,
        lng = origin.lng,
        radius,
        scanned,
        found = found.len(),
        "Nearby search complete"
    );

    Ok(Json(found))
}
