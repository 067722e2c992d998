//! Platforms module
//!
//! This module provides the platform SDK including:
//! - The `PlatformAdapter` trait defining the normalization contract
//! - The platform registry holding static OAuth/API configuration and the
//!   adapter lookup table
//! - Individual adapter implementations

pub mod adapter;
pub mod registry;
pub mod regional;
pub mod spotify;
pub mod youtube;

pub use adapter::{
    AdapterError, AggregateStats, Collection, CollectionItem, PlatformAdapter, PlatformProfile,
    SegmentRanking, TopContent, TopItem, COLLECTION_ITEM_CAP,
};
pub use registry::{PlatformConfig, PlatformRegistry, RegistryError, TokenEndpointAuth};
pub use regional::RegionalAdapter;
pub use spotify::SpotifyAdapter;
pub use youtube::YouTubeAdapter;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The fixed set of external platforms an artist can link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Spotify,
    Youtube,
    Melon,
    Genie,
    Bugs,
}

impl Platform {
    /// All platforms, in registry order.
    pub const ALL: [Platform; 5] = [
        Platform::Spotify,
        Platform::Youtube,
        Platform::Melon,
        Platform::Genie,
        Platform::Bugs,
    ];

    /// Stable slug used in URLs and the connections table.
    pub fn as_slug(&self) -> &'static str {
        match self {
            Platform::Spotify => "spotify",
            Platform::Youtube => "youtube",
            Platform::Melon => "melon",
            Platform::Genie => "genie",
            Platform::Bugs => "bugs",
        }
    }

    /// Parse a slug as used in URLs and stored rows.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "spotify" => Some(Platform::Spotify),
            "youtube" => Some(Platform::Youtube),
            "melon" => Some(Platform::Melon),
            "genie" => Some(Platform::Genie),
            "bugs" => Some(Platform::Bugs),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_slug())
    }
}
