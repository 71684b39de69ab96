use crate::config::GeocodingConfig;
use crate::geo::Coordinate;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

const SUBLOCALITY_FIELDS: [&str; 4] = ["neighbourhood", "suburb", "village", "quarter"];
const CITY_FIELDS: [&str; 3] = ["city", "town", "municipality"];
const REGION_FIELDS: [&str; 2] = ["state", "province"];

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("geocoding service responded with status {0}")]
    Status(u16),

    #[error("geocoding response could not be decoded: {0}")]
    Decode(String),
}

/// Address details returned by a reverse lookup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReverseLookup {
    #[serde(default)]
    pub address: Map<String, Value>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, point: Coordinate) -> Result<ReverseLookup, GeocodeError>;
}

/// City used when the service resolves no city, for points inside its bounding box.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FallbackLocality {
    pub city: String,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Default for FallbackLocality {
    fn default() -> Self {
        Self {
            city: "Cagayan de Oro City".to_string(),
            min_lat: 8.3,
            max_lat: 8.6,
            min_lng: 124.5,
            max_lng: 124.8,
        }
    }
}

impl FallbackLocality {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lng..=self.max_lng).contains(&lng)
    }

    /// `"{city} (Lat: .., Lng: ..)"`, used when nothing better is known.
    pub fn describe(&self, point: Coordinate) -> String {
        format!("{} (Lat: {:.6}, Lng: {:.6})", self.city, point.lat, point.lng)
    }
}

/// Build a short display address from the service's address components.
///
/// Preference: sublocality, road, city (or the fallback city inside its
/// bounding box), then state. Returns `None` when nothing was resolved.
pub fn compose_address(
    address: &Map<String, Value>,
    point: Coordinate,
    fallback: &FallbackLocality,
) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();

    if let Some(sublocality) = first_field(address, &SUBLOCALITY_FIELDS) {
        parts.push(sublocality);
    }
    if let Some(road) = first_field(address, &["road"]) {
        parts.push(road);
    }
    match first_field(address, &CITY_FIELDS) {
        Some(city) => parts.push(city),
        None if fallback.contains(point.lat, point.lng) => parts.push(&fallback.city),
        None => {}
    }
    if let Some(region) = first_field(address, &REGION_FIELDS) {
        parts.push(region);
    }

    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Display line for a lookup: composed parts, else the service's display name, else the fallback.
pub fn display_address(
    lookup: &ReverseLookup,
    point: Coordinate,
    fallback: &FallbackLocality,
) -> String {
    compose_address(&lookup.address, point, fallback)
        .or_else(|| lookup.display_name.clone().filter(|name| !name.trim().is_empty()))
        .unwrap_or_else(|| fallback.describe(point))
}

fn first_field<'a>(address: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a str> {
    fields.iter().find_map(|field| {
        address
            .get(*field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    })
}

/// Reverse geocoder backed by a Nominatim-compatible `/reverse` endpoint
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
    zoom: u8,
    accept_language: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/reverse", config.base_url.trim_end_matches('/')),
            zoom: config.zoom,
            accept_language: config.accept_language.clone(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, point: Coordinate) -> Result<ReverseLookup, GeocodeError> {
        debug!(lat = point.lat, lng = point.lng, "Reverse geocoding");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("format", "json".to_string()),
                ("lat", point.lat.to_string()),
                ("lon", point.lng.to_string()),
                ("zoom", self.zoom.to_string()),
                ("addressdetails", "1".to_string()),
                ("accept-language", self.accept_language.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| GeocodeError::Decode(e.to_string()))
    }
}

/// Local stand-in for a Nominatim server. Each base path has its own `/reverse`:
/// `ok` echoes the query parameters back as the address, `failing` answers 500,
/// `html` answers a non-JSON 200 and `slow` answers after three seconds.
#[cfg(test)]
pub(crate) async fn spawn_fake_nominatim() -> String {
    use axum::{extract::Query, http::StatusCode, response::Html, routing::get, Json, Router};
    use std::collections::HashMap;
    use std::time::Duration;

    let app = Router::new()
        .route(
            "/ok/reverse",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(serde_json::json!({ "address": params }))
            }),
        )
        .route("/failing/reverse", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/html/reverse", get(|| async { Html("<html>") }))
        .route(
            "/slow/reverse",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(serde_json::json!({ "display_name": "too late" }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
