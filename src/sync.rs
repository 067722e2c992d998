//! Sync orchestrator
//!
//! Pulls a platform's stats through its adapter in one pass: top content,
//! collections and aggregate totals are fetched concurrently, and
//! `last_synced_at` is advanced only when the whole pass succeeds.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{upstream_error, ApiError};
use crate::platforms::{
    AdapterError, AggregateStats, Collection, Platform, PlatformRegistry, TopContent,
};
use crate::repositories::ConnectionRepository;

/// Everything one sync pass produced for a platform.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncReport {
    pub platform: Platform,
    pub synced_at: DateTime<Utc>,
    pub top_content: TopContent,
    pub collections: Vec<Collection>,
    pub aggregate: AggregateStats,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("no active {platform} connection for this user")]
    NotConnected { platform: Platform },

    #[error("upstream fetch failed")]
    Upstream(#[source] AdapterError),

    #[error("failed to persist sync bookkeeping")]
    Persistence(#[source] anyhow::Error),
}

impl From<SyncError> for ApiError {
    fn from(error: SyncError) -> Self {
        match error {
            SyncError::NotConnected { platform } => ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_CONNECTED",
                &format!("No active {} connection", platform),
            ),
            SyncError::Upstream(source) => match &source {
                AdapterError::Unauthorized { platform, status } => upstream_error(
                    "UPSTREAM_AUTH_FAILED",
                    platform.to_string(),
                    *status,
                    Some("stored access token was rejected; re-link the platform".to_string()),
                ),
                AdapterError::Http {
                    platform,
                    status,
                    snippet,
                } => upstream_error(
                    "UPSTREAM_ERROR",
                    platform.to_string(),
                    *status,
                    Some(snippet.clone()),
                ),
                other => {
                    tracing::error!("Sync upstream failure: {:?}", other);
                    ApiError::new(
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_ERROR",
                        "The platform could not be reached",
                    )
                    .with_details(json!({ "detail": other.to_string() }))
                }
            },
            SyncError::Persistence(source) => source.into(),
        }
    }
}

/// Run one sync pass for (user, platform).
///
/// The three fetches run concurrently against the stored access token. Any
/// failure aborts the pass before `last_synced_at` is touched, so the column
/// always reflects the most recent fully successful sync.
pub async fn run_sync(
    registry: &PlatformRegistry,
    connections: &ConnectionRepository,
    user_id: Uuid,
    platform: Platform,
) -> Result<SyncReport, SyncError> {
    let connection = connections
        .find_active(user_id, platform)
        .await
        .map_err(SyncError::Persistence)?
        .ok_or(SyncError::NotConnected { platform })?;

    let adapter = registry.adapter(platform);
    let token = connection.access_token.clone();

    let (top_content, collections, aggregate) = tokio::try_join!(
        adapter.fetch_top_content(&token),
        adapter.fetch_collections(&token),
        adapter.fetch_aggregate_stats(&token),
    )
    .map_err(SyncError::Upstream)?;

    let synced_at = Utc::now();
    connections
        .touch_last_synced(connection, synced_at)
        .await
        .map_err(SyncError::Persistence)?;

    tracing::info!(
        user_id = %user_id,
        platform = %platform,
        top_items = top_content.items.len(),
        collections = collections.len(),
        "Sync pass completed"
    );

    Ok(SyncReport {
        platform,
        synced_at,
        top_content,
        collections,
        aggregate,
    })
}
