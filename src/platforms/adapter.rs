//! Platform adapter trait definition
//!
//! Defines the normalization contract that all platform adapter
//! implementations must follow, along with the normalized result types the
//! dashboard consumes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::Platform;

/// Maximum number of items enumerated per collection; the remainder is
/// reported through [`Collection::more_count`].
pub const COLLECTION_ITEM_CAP: usize = 5;

/// Adapter error types for structured error handling.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The platform rejected the stored access token (expired or revoked).
    /// Recovery is a full re-authorization; tokens are never auto-refreshed.
    #[error("{platform} rejected the access token (status {status})")]
    Unauthorized { platform: Platform, status: u16 },

    /// Any other non-2xx from the platform's data API.
    #[error("{platform} API error {status}: {snippet}")]
    Http {
        platform: Platform,
        status: u16,
        snippet: String,
    },

    /// Network or connectivity error, including request timeouts.
    #[error("network error calling {platform}: {source}")]
    Network {
        platform: Platform,
        #[source]
        source: reqwest::Error,
    },

    /// The platform returned a 2xx with a body we could not interpret.
    #[error("malformed response from {platform}: {details}")]
    MalformedResponse { platform: Platform, details: String },
}

impl AdapterError {
    /// Status code reported by the upstream platform, when one exists.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AdapterError::Unauthorized { status, .. } | AdapterError::Http { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// External account identity returned by a platform's "who am I" endpoint.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    /// The external account's stable identifier
    pub id: String,
    /// Email address, where the platform exposes one
    pub email: Option<String>,
    /// Display name, where the platform exposes one
    pub display_name: Option<String>,
}

/// One ranked item (track, video, song) with its popularity/view metric.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopItem {
    /// 1-based rank within its list
    pub rank: u32,
    /// Display name of the item
    pub title: String,
    /// Artist/channel attribution
    pub attribution: String,
    /// Popularity score or view count, depending on the platform
    pub metric: u64,
}

/// A labeled sub-ranking, e.g. the video platform's "music" and "video"
/// buckets, each with its own aggregate metric total.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SegmentRanking {
    /// Bucket label ("music", "video")
    pub label: String,
    /// Sum of the metric across every item classified into this bucket
    pub total_metric: u64,
    /// Ranked items within the bucket
    pub items: Vec<TopItem>,
}

/// Ranked top content for one platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TopContent {
    /// Overall ranking, independent of any segmentation
    pub items: Vec<TopItem>,
    /// Labeled sub-rankings; empty for platforms without segmentation
    pub segments: Vec<SegmentRanking>,
}

/// One item inside a collection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollectionItem {
    /// Display name of the item
    pub title: String,
    /// Artist/channel attribution
    pub attribution: String,
    /// Popularity score or view count; zero where unavailable
    pub metric: u64,
}

/// A named collection (playlist, album) with a capped item enumeration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Collection {
    /// The platform's identifier for the collection
    pub external_id: String,
    /// Collection display name
    pub name: String,
    /// Total number of items the platform reports for the collection
    pub item_count: u64,
    /// First [`COLLECTION_ITEM_CAP`] items
    pub items: Vec<CollectionItem>,
    /// How many further items exist beyond the enumerated ones
    pub more_count: u64,
}

/// Aggregate account totals. Fields a platform cannot supply are zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct AggregateStats {
    /// Follower/subscriber count
    pub followers: u64,
    /// Cumulative view/stream count
    pub total_views: u64,
    /// Cumulative like count
    pub total_likes: u64,
    /// Number of uploads/tracks the account exposes
    pub content_count: u64,
}

/// The per-platform normalization contract.
///
/// Given a valid access token, each implementation fetches and normalizes
/// platform-specific data. Implementations never refresh tokens; an expired
/// token surfaces as [`AdapterError::Unauthorized`].
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// The platform this adapter serves.
    fn platform(&self) -> Platform;

    /// Fetch the external account's identity (id and, where available, email).
    async fn fetch_profile(&self, access_token: &str) -> Result<PlatformProfile, AdapterError>;

    /// Fetch the most-played/most-popular items, ranked.
    async fn fetch_top_content(&self, access_token: &str) -> Result<TopContent, AdapterError>;

    /// Fetch named collections with capped item enumeration.
    async fn fetch_collections(&self, access_token: &str)
        -> Result<Vec<Collection>, AdapterError>;

    /// Fetch aggregate totals, zero-filled where the platform has no data.
    async fn fetch_aggregate_stats(
        &self,
        access_token: &str,
    ) -> Result<AggregateStats, AdapterError>;
}

/// Shared GET helper: bearer-authenticated JSON fetch with uniform error
/// mapping. 401/403 map to `Unauthorized`, other non-2xx to `Http` with a
/// truncated snippet.
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    platform: Platform,
    url: &str,
    access_token: &str,
) -> Result<T, AdapterError> {
    let response = client
        .get(url)
        .bearer_auth(access_token)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|source| AdapterError::Network { platform, source })?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(AdapterError::Unauthorized {
            platform,
            status: status.as_u16(),
        });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdapterError::Http {
            platform,
            status: status.as_u16(),
            snippet: crate::error::truncate_snippet(&body),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|err| AdapterError::MalformedResponse {
            platform,
            details: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_carries_upstream_status() {
        let err = AdapterError::Unauthorized {
            platform: Platform::Spotify,
            status: 401,
        };
        assert_eq!(err.upstream_status(), Some(401));
        assert!(err.to_string().contains("spotify"));
    }

    #[test]
    fn aggregate_stats_default_is_zero_filled() {
        let stats = AggregateStats::default();
        assert_eq!(stats.followers, 0);
        assert_eq!(stats.total_views, 0);
        assert_eq!(stats.total_likes, 0);
        assert_eq!(stats.content_count, 0);
    }
}
