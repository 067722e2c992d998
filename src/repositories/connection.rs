//! Connection repository for database operations
//!
//! Encapsulates SeaORM operations for the connections table. Rows are keyed
//! by the natural (user_id, platform) pair: re-authorization upserts onto the
//! existing row and disconnect deactivates instead of deleting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::connection::{self, Entity as Connection};
use crate::platforms::Platform;

/// Token material captured from a completed token exchange.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
}

/// Repository for connection database operations
#[derive(Debug, Clone)]
pub struct ConnectionRepository {
    pub db: Arc<DatabaseConnection>,
}

impl ConnectionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert or overwrite the single row for (user_id, platform).
    ///
    /// A re-link after disconnect reuses the deactivated row, flipping it
    /// back to active with the fresh tokens.
    pub async fn upsert_active(
        &self,
        user_id: Uuid,
        platform: Platform,
        platform_user_id: &str,
        grant: &TokenGrant,
    ) -> Result<connection::Model> {
        let now = Utc::now();
        let model = connection::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            platform: Set(platform.as_slug().to_string()),
            access_token: Set(grant.access_token.clone()),
            refresh_token: Set(grant.refresh_token.clone()),
            token_expires_at: Set(grant.token_expires_at.map(Into::into)),
            platform_user_id: Set(platform_user_id.to_string()),
            is_active: Set(true),
            last_synced_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let on_conflict = OnConflict::columns([
            connection::Column::UserId,
            connection::Column::Platform,
        ])
        .update_columns([
            connection::Column::AccessToken,
            connection::Column::RefreshToken,
            connection::Column::TokenExpiresAt,
            connection::Column::PlatformUserId,
            connection::Column::IsActive,
            connection::Column::UpdatedAt,
        ])
        .to_owned();

        let result = Connection::insert(model)
            .on_conflict(on_conflict)
            .exec_with_returning(self.db.as_ref())
            .await?;

        tracing::info!(
            user_id = %user_id,
            platform = %platform,
            connection_id = %result.id,
            "Connection upserted"
        );
        Ok(result)
    }

    /// The active connection for (user_id, platform), if one exists.
    pub async fn find_active(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<connection::Model>> {
        Ok(Connection::find()
            .filter(connection::Column::UserId.eq(user_id))
            .filter(connection::Column::Platform.eq(platform.as_slug()))
            .filter(connection::Column::IsActive.eq(true))
            .one(self.db.as_ref())
            .await?)
    }

    /// All active connections for a user, oldest link first.
    pub async fn list_active_by_user(&self, user_id: Uuid) -> Result<Vec<connection::Model>> {
        Ok(Connection::find()
            .filter(connection::Column::UserId.eq(user_id))
            .filter(connection::Column::IsActive.eq(true))
            .order_by_asc(connection::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?)
    }

    /// Deactivate the connection, keeping the row. Returns `None` when no
    /// active connection exists for the pair. The platform-side grant is not
    /// revoked; the tokens simply stop being used.
    pub async fn deactivate(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<connection::Model>> {
        let Some(existing) = self.find_active(user_id, platform).await? else {
            return Ok(None);
        };

        let mut active: connection::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(self.db.as_ref()).await?;

        tracing::info!(
            user_id = %user_id,
            platform = %platform,
            connection_id = %updated.id,
            "Connection deactivated"
        );
        Ok(Some(updated))
    }

    /// Record a successful sync. Failed syncs never touch this column.
    pub async fn touch_last_synced(
        &self,
        connection: connection::Model,
        synced_at: DateTime<Utc>,
    ) -> Result<connection::Model> {
        let mut active: connection::ActiveModel = connection.into();
        active.last_synced_at = Set(Some(synced_at.into()));
        active.updated_at = Set(synced_at.into());
        Ok(active.update(self.db.as_ref()).await?)
    }
}
