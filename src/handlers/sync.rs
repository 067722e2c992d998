//! Sync handler

use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::auth::Session;
use crate::error::ApiError;
use crate::sync::{run_sync, SyncReport};
use crate::server::AppState;

use super::oauth::PlatformPath;

/// Pull fresh stats from a linked platform
///
/// Runs one sync pass against the caller's active connection: top content,
/// collections and aggregate totals, fetched concurrently. Advances
/// `last_synced_at` only on full success.
#[utoipa::path(
    post,
    path = "/platforms/{platform}/sync",
    security(("bearer_auth" = [])),
    params(
        ("platform" = String, Path, description = "Platform slug (e.g. 'spotify')")
    ),
    responses(
        (status = 200, description = "Sync completed", body = SyncReport),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Unknown platform or not connected", body = ApiError),
        (status = 502, description = "Upstream fetch failed", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn sync_platform(
    State(state): State<AppState>,
    session: Session,
    Path(path): Path<PlatformPath>,
) -> Result<Json<SyncReport>, ApiError> {
    let platform = state.registry.resolve_slug(&path.platform).map_err(|_| {
        ApiError::new(
            axum::http::StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("platform '{}' not found", path.platform),
        )
    })?;

    let report = run_sync(
        &state.registry,
        &state.connections(),
        session.user_id,
        platform,
    )
    .await?;
    Ok(Json(report))
}
