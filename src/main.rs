mod api;
mod config;
mod geo;
mod storage;

use crate::api::AppState;
use crate::config::{AppConfig, StorageBackend};
use crate::geo::{NominatimGeocoder, ReverseGeocoder};
use crate::storage::{EstablishmentRepository, MemoryRepository, MongoRepository};
use axum::http::{header, Method};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("🚀 Starting Establishment Directory API");

    // Load configuration
    let config = AppConfig::load()?;
    info!("📋 Configuration loaded");
    info!("   - Storage: {} ({})", config.storage.backend, config.storage.database);
    info!("   - Geocoder: {}", config.geocoding.base_url);
    info!("   - Server: {}:{}", config.server.host, config.server.port);

    // Initialize storage
    info!("💾 Initializing establishment storage...");
    let repository: Arc<dyn EstablishmentRepository> = match config.storage.backend {
        StorageBackend::Mongodb => Arc::new(MongoRepository::connect(&config.storage).await?),
        StorageBackend::Memory => Arc::new(MemoryRepository::new()),
    };
    match repository.ping().await {
        Ok(()) => info!("✅ Storage ready"),
        Err(e) => warn!("⚠️  Storage not reachable yet: {}", e),
    }

    // Initialize geocoder
    let geocoder: Arc<dyn ReverseGeocoder> = Arc::new(NominatimGeocoder::new(&config.geocoding)?);
    info!(
        "🗺️  Reverse geocoder ready (timeout: {}s)",
        config.geocoding.timeout_secs
    );

    // Create application state
    let state = AppState {
        repository,
        geocoder,
        fallback_locality: Arc::new(config.geocoding.fallback.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let mut app = api::router(state);
    if config.server.static_dir.is_dir() {
        info!("📂 Serving static files from {:?}", config.server.static_dir);
        app = app.fallback_service(ServeDir::new(&config.server.static_dir));
    }
    let app = app.layer(cors).layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📡 Available endpoints:");
    info!("   GET    /health                    - Health check");
    info!("   GET    /api/establishments        - List establishments");
    info!("   POST   /api/establishments        - Create establishment");
    info!("   GET    /api/establishments/{{id}}   - Get establishment");
    info!("   PUT    /api/establishments/{{id}}   - Update establishment");
    info!("   DELETE /api/establishments/{{id}}   - Delete establishment");
    info!("   GET    /api/geocode               - Reverse geocode a point");
    info!("   GET    /api/nearby                - Establishments near a point");
    info!("");
    info!("✨ Server is ready to accept requests!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
