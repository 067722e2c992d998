//! # Server Configuration
//!
//! This module contains the server setup and configuration for the StageSync
//! API: shared application state, the router, and the serve loop.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers;
use crate::platforms::PlatformRegistry;
use crate::repositories::{ConnectionRepository, UserRepository};
use crate::telemetry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub registry: Arc<PlatformRegistry>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let registry = PlatformRegistry::from_config(&config);
        Self {
            config: Arc::new(config),
            db: Arc::new(db),
            registry: Arc::new(registry),
        }
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(Arc::clone(&self.db))
    }

    pub fn connections(&self) -> ConnectionRepository {
        ConnectionRepository::new(Arc::clone(&self.db))
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route(
            "/oauth/{platform}/authorize",
            post(handlers::oauth::authorize),
        )
        .route(
            "/oauth/{platform}/callback",
            post(handlers::oauth::callback_post).get(handlers::oauth::callback_get),
        )
        .route(
            "/platforms/{platform}/sync",
            post(handlers::sync::sync_platform),
        )
        .route("/connections", get(handlers::connections::list_connections))
        .route(
            "/connections/{platform}",
            delete(handlers::connections::disconnect),
        )
        .layer(middleware::from_fn(telemetry::trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState::new(config, db);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::oauth::authorize,
        crate::handlers::oauth::callback_post,
        crate::handlers::oauth::callback_get,
        crate::handlers::sync::sync_platform,
        crate::handlers::connections::list_connections,
        crate::handlers::connections::disconnect,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::error::UpstreamError,
            crate::platforms::Platform,
            crate::platforms::TopItem,
            crate::platforms::SegmentRanking,
            crate::platforms::TopContent,
            crate::platforms::CollectionItem,
            crate::platforms::Collection,
            crate::platforms::AggregateStats,
            crate::oauth::Purpose,
            crate::handlers::oauth::AuthorizeRequest,
            crate::handlers::oauth::AuthorizeResponse,
            crate::handlers::oauth::CallbackResponse,
            crate::handlers::connections::ConnectionSummary,
            crate::handlers::connections::ConnectionListResponse,
            crate::handlers::connections::DisconnectResponse,
            crate::sync::SyncReport,
        )
    ),
    info(
        title = "StageSync API",
        description = "Platform connections and stats sync for the artist dashboard",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
