//! User repository for database operations

use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::user::{self, Entity as User};

/// Repository for user database operations
#[derive(Debug, Clone)]
pub struct UserRepository {
    pub db: Arc<DatabaseConnection>,
}

impl UserRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Email is the login/signup lookup key.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        Ok(User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?)
    }

    pub async fn create(&self, email: &str, display_name: &str) -> Result<user::Model> {
        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            display_name: Set(display_name.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        Ok(model.insert(self.db.as_ref()).await?)
    }

    /// Signup resolution: an existing account with the same email wins, so a
    /// signup against a known address behaves as a login.
    pub async fn find_or_create(&self, email: &str, display_name: &str) -> Result<user::Model> {
        if let Some(existing) = self.find_by_email(email).await? {
            return Ok(existing);
        }
        self.create(email, display_name).await
    }
}
