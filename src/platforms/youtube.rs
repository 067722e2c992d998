//! YouTube adapter
//!
//! Normalizes the YouTube Data API v3. Uploads are partitioned into "music"
//! and "video" buckets using the video category, and each bucket carries its
//! own view total and ranking. Channel statistics supply the aggregate
//! totals; YouTube reports numeric statistics as JSON strings.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use super::adapter::{
    get_json, AdapterError, AggregateStats, Collection, CollectionItem, PlatformAdapter,
    PlatformProfile, SegmentRanking, TopContent, TopItem, COLLECTION_ITEM_CAP,
};
use super::Platform;

/// YouTube's category id for Music.
const MUSIC_CATEGORY_ID: &str = "10";

/// How many uploads to rank per sync.
const UPLOAD_LIMIT: usize = 50;

/// How many playlists to enumerate per sync.
const PLAYLIST_LIMIT: usize = 20;

pub struct YouTubeAdapter {
    client: reqwest::Client,
    api_base: String,
}

impl YouTubeAdapter {
    pub fn new(client: reqwest::Client, api_base: String) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> Result<T, AdapterError> {
        let url = format!("{}{}", self.api_base, path);
        get_json(&self.client, Platform::Youtube, &url, access_token).await
    }

    async fn uploads_playlist_id(&self, access_token: &str) -> Result<String, AdapterError> {
        let channels: ChannelListResponse = self
            .get(
                "/youtube/v3/channels?part=contentDetails,statistics&mine=true",
                access_token,
            )
            .await?;
        channels
            .items
            .into_iter()
            .next()
            .and_then(|c| c.content_details)
            .map(|d| d.related_playlists.uploads)
            .ok_or_else(|| AdapterError::MalformedResponse {
                platform: Platform::Youtube,
                details: "channel list did not include an uploads playlist".to_string(),
            })
    }
}

// YouTube serializes statistics counters as strings.
fn string_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse::<u64>().map_err(serde::de::Error::custom)
}

fn default_zero() -> u64 {
    0
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    id: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelResource>,
}

#[derive(Debug, Deserialize)]
struct ChannelResource {
    #[serde(rename = "contentDetails")]
    content_details: Option<ChannelContentDetails>,
    statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Deserialize)]
struct ChannelContentDetails {
    #[serde(rename = "relatedPlaylists")]
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
struct ChannelStatistics {
    #[serde(rename = "subscriberCount", deserialize_with = "string_u64", default = "default_zero")]
    subscriber_count: u64,
    #[serde(rename = "viewCount", deserialize_with = "string_u64", default = "default_zero")]
    view_count: u64,
    #[serde(rename = "videoCount", deserialize_with = "string_u64", default = "default_zero")]
    video_count: u64,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItemResource>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemResource {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemSnippet {
    title: String,
    #[serde(rename = "videoOwnerChannelTitle", default)]
    video_owner_channel_title: Option<String>,
    #[serde(rename = "resourceId")]
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    snippet: VideoSnippet,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: String,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
    #[serde(rename = "categoryId", default)]
    category_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct VideoStatistics {
    #[serde(rename = "viewCount", deserialize_with = "string_u64", default = "default_zero")]
    view_count: u64,
}

#[derive(Debug, Deserialize)]
struct PlaylistListResponse {
    #[serde(default)]
    items: Vec<PlaylistResource>,
}

#[derive(Debug, Deserialize)]
struct PlaylistResource {
    id: String,
    snippet: PlaylistSnippet,
    #[serde(rename = "contentDetails")]
    content_details: Option<PlaylistContentDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistContentDetails {
    #[serde(rename = "itemCount", default)]
    item_count: u64,
}

struct RankedVideo {
    title: String,
    attribution: String,
    views: u64,
    is_music: bool,
}

fn rank_bucket(videos: &[RankedVideo], music: bool, label: &str) -> SegmentRanking {
    let mut bucket: Vec<&RankedVideo> = videos.iter().filter(|v| v.is_music == music).collect();
    bucket.sort_by(|a, b| b.views.cmp(&a.views));
    let total_metric = bucket.iter().map(|v| v.views).sum();
    let items = bucket
        .into_iter()
        .enumerate()
        .map(|(i, v)| TopItem {
            rank: i as u32 + 1,
            title: v.title.clone(),
            attribution: v.attribution.clone(),
            metric: v.views,
        })
        .collect();
    SegmentRanking {
        label: label.to_string(),
        total_metric,
        items,
    }
}

#[async_trait]
impl PlatformAdapter for YouTubeAdapter {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<PlatformProfile, AdapterError> {
        let info: UserInfo = self.get("/oauth2/v2/userinfo", access_token).await?;
        Ok(PlatformProfile {
            id: info.id,
            email: info.email,
            display_name: info.name,
        })
    }

    async fn fetch_top_content(&self, access_token: &str) -> Result<TopContent, AdapterError> {
        let uploads = self.uploads_playlist_id(access_token).await?;
        let page: PlaylistItemListResponse = self
            .get(
                &format!(
                    "/youtube/v3/playlistItems?part=snippet&maxResults={UPLOAD_LIMIT}&playlistId={uploads}"
                ),
                access_token,
            )
            .await?;

        let video_ids: Vec<String> = page
            .items
            .into_iter()
            .filter_map(|item| item.snippet.resource_id.video_id)
            .collect();
        if video_ids.is_empty() {
            return Ok(TopContent {
                items: Vec::new(),
                segments: vec![
                    rank_bucket(&[], true, "music"),
                    rank_bucket(&[], false, "video"),
                ],
            });
        }

        let videos: VideoListResponse = self
            .get(
                &format!(
                    "/youtube/v3/videos?part=snippet,statistics&id={}",
                    video_ids.join(",")
                ),
                access_token,
            )
            .await?;

        let ranked: Vec<RankedVideo> = videos
            .items
            .into_iter()
            .map(|v| RankedVideo {
                is_music: v.snippet.category_id == MUSIC_CATEGORY_ID,
                title: v.snippet.title,
                attribution: v.snippet.channel_title,
                views: v.statistics.unwrap_or_default().view_count,
            })
            .collect();

        let mut overall: Vec<&RankedVideo> = ranked.iter().collect();
        overall.sort_by(|a, b| b.views.cmp(&a.views));
        let items = overall
            .into_iter()
            .enumerate()
            .map(|(i, v)| TopItem {
                rank: i as u32 + 1,
                title: v.title.clone(),
                attribution: v.attribution.clone(),
                metric: v.views,
            })
            .collect();

        Ok(TopContent {
            items,
            segments: vec![
                rank_bucket(&ranked, true, "music"),
                rank_bucket(&ranked, false, "video"),
            ],
        })
    }

    async fn fetch_collections(
        &self,
        access_token: &str,
    ) -> Result<Vec<Collection>, AdapterError> {
        let page: PlaylistListResponse = self
            .get(
                &format!(
                    "/youtube/v3/playlists?part=snippet,contentDetails&mine=true&maxResults={PLAYLIST_LIMIT}"
                ),
                access_token,
            )
            .await?;

        let mut collections = Vec::with_capacity(page.items.len());
        for playlist in page.items {
            let entries: PlaylistItemListResponse = self
                .get(
                    &format!(
                        "/youtube/v3/playlistItems?part=snippet&maxResults={COLLECTION_ITEM_CAP}&playlistId={}",
                        playlist.id
                    ),
                    access_token,
                )
                .await?;

            let items: Vec<CollectionItem> = entries
                .items
                .into_iter()
                .take(COLLECTION_ITEM_CAP)
                .map(|entry| CollectionItem {
                    title: entry.snippet.title,
                    attribution: entry.snippet.video_owner_channel_title.unwrap_or_default(),
                    // Per-item view counts would need one more call per video
                    metric: 0,
                })
                .collect();

            let item_count = playlist
                .content_details
                .map(|d| d.item_count)
                .unwrap_or(items.len() as u64);
            let more_count = item_count.saturating_sub(items.len() as u64);
            collections.push(Collection {
                external_id: playlist.id,
                name: playlist.snippet.title,
                item_count,
                items,
                more_count,
            });
        }

        Ok(collections)
    }

    async fn fetch_aggregate_stats(
        &self,
        access_token: &str,
    ) -> Result<AggregateStats, AdapterError> {
        let channels: ChannelListResponse = self
            .get(
                "/youtube/v3/channels?part=statistics&mine=true",
                access_token,
            )
            .await?;
        let stats = channels
            .items
            .into_iter()
            .next()
            .and_then(|c| c.statistics)
            .ok_or_else(|| AdapterError::MalformedResponse {
                platform: Platform::Youtube,
                details: "channel list did not include statistics".to_string(),
            })?;

        // YouTube exposes no account-wide like total.
        Ok(AggregateStats {
            followers: stats.subscriber_count,
            total_views: stats.view_count,
            total_likes: 0,
            content_count: stats.video_count,
        })
    }
}
