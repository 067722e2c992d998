//! HTTP handlers
//!
//! Thin axum handlers that translate requests into calls on the OAuth flow,
//! the sync orchestrator and the repositories.

pub mod connections;
pub mod oauth;
pub mod sync;

use axum::extract::State;
use axum::response::Json;

use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;

/// Service information
///
/// Returns the service name, version, and the platforms the deployment has
/// OAuth credentials for (the set the dashboard offers connect buttons for).
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "service"
)]
pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo::with_platforms(
        state.registry.configured_platforms(),
    ))
}

/// Liveness and database health
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Database is unreachable", body = ApiError)
    ),
    tag = "service"
)]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    crate::db::health_check(&state.db).await.map_err(|e| {
        tracing::error!("Health check failed: {:?}", e);
        ApiError::new(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database is unreachable",
        )
    })?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
