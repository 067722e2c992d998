//! # Data Models
//!
//! This module contains all the data models used throughout the StageSync API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::platforms::Platform;

pub mod connection;
pub mod user;

pub use connection::Entity as Connection;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
    /// Platforms with complete OAuth credentials on this deployment
    pub platforms: Vec<Platform>,
}

impl ServiceInfo {
    pub fn with_platforms(platforms: Vec<Platform>) -> Self {
        Self {
            platforms,
            ..Self::default()
        }
    }
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "stagesync".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            platforms: Vec::new(),
        }
    }
}
