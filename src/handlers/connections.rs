//! Connection listing and disconnect handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::Session;
use crate::error::ApiError;
use crate::models::connection;
use crate::platforms::Platform;
use crate::server::AppState;

use super::oauth::PlatformPath;

/// One linked platform, as shown on the dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectionSummary {
    pub platform: String,
    pub platform_user_id: String,
    pub is_active: bool,
    pub connected_at: DateTime<Utc>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl From<connection::Model> for ConnectionSummary {
    fn from(model: connection::Model) -> Self {
        Self {
            platform: model.platform,
            platform_user_id: model.platform_user_id,
            is_active: model.is_active,
            connected_at: model.created_at.with_timezone(&Utc),
            last_synced_at: model.last_synced_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectionListResponse {
    pub connections: Vec<ConnectionSummary>,
}

/// List the caller's active connections
#[utoipa::path(
    get,
    path = "/connections",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active connections", body = ConnectionListResponse),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn list_connections(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ConnectionListResponse>, ApiError> {
    let connections = state
        .connections()
        .list_active_by_user(session.user_id)
        .await?
        .into_iter()
        .map(ConnectionSummary::from)
        .collect();
    Ok(Json(ConnectionListResponse { connections }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DisconnectResponse {
    pub platform: Platform,
    pub disconnected: bool,
}

/// Disconnect a platform
///
/// Deactivates the caller's connection. The row and its sync history are
/// kept, and the platform-side grant is not revoked.
#[utoipa::path(
    delete,
    path = "/connections/{platform}",
    security(("bearer_auth" = [])),
    params(
        ("platform" = String, Path, description = "Platform slug (e.g. 'spotify')")
    ),
    responses(
        (status = 200, description = "Connection deactivated", body = DisconnectResponse),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Unknown platform or not connected", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn disconnect(
    State(state): State<AppState>,
    session: Session,
    Path(path): Path<PlatformPath>,
) -> Result<Json<DisconnectResponse>, ApiError> {
    let platform = state.registry.resolve_slug(&path.platform).map_err(|_| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("platform '{}' not found", path.platform),
        )
    })?;

    let deactivated = state
        .connections()
        .deactivate(session.user_id, platform)
        .await?;
    if deactivated.is_none() {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_CONNECTED",
            &format!("No active {} connection", platform),
        ));
    }

    Ok(Json(DisconnectResponse {
        platform,
        disconnected: true,
    }))
}
