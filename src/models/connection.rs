//! Connection entity model
//!
//! This module contains the SeaORM entity model for the connections table,
//! which stores one external platform link per (user, platform).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use super::user::Entity as User;

/// Connection entity representing a user's link to one external platform.
///
/// At most one row per (user_id, platform) exists; re-authorization
/// overwrites the row and disconnect flips `is_active` rather than deleting,
/// preserving sync history for support workflows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "connections")]
pub struct Model {
    /// Unique identifier for the connection (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning user account
    pub user_id: Uuid,

    /// Platform slug (e.g. "spotify", "youtube")
    pub platform: String,

    /// Opaque bearer credential for the platform's data APIs
    pub access_token: String,

    /// Longer-lived refresh credential; stored but never exercised
    pub refresh_token: Option<String>,

    /// Absolute access-token expiry, computed as now + provider `expires_in`
    pub token_expires_at: Option<DateTimeWithTimeZone>,

    /// The external account's stable identifier
    pub platform_user_id: String,

    /// False means disconnected; the row is retained rather than deleted
    pub is_active: bool,

    /// Timestamp of the most recent successful sync, null until first sync
    pub last_synced_at: Option<DateTimeWithTimeZone>,

    /// Timestamp when the connection was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the connection was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "User",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<User> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
