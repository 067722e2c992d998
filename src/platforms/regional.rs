//! Regional platform adapter
//!
//! Melon, Genie and Bugs expose partner APIs with the same shape, so one
//! parameterized adapter serves all three. Songs carry cumulative play
//! counts, albums act as the collection surface, and the artist summary
//! supplies aggregate totals.

use async_trait::async_trait;
use serde::Deserialize;

use super::adapter::{
    get_json, AdapterError, AggregateStats, Collection, CollectionItem, PlatformAdapter,
    PlatformProfile, TopContent, TopItem, COLLECTION_ITEM_CAP,
};
use super::Platform;

pub struct RegionalAdapter {
    platform: Platform,
    client: reqwest::Client,
    api_base: String,
}

impl RegionalAdapter {
    pub fn new(platform: Platform, client: reqwest::Client, api_base: String) -> Self {
        Self {
            platform,
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
        get_json(&self.client, self.platform, &url, access_token).await
    }
}

#[derive(Debug, Deserialize)]
struct PartnerProfile {
    id: String,
    email: Option<String>,
    nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SongChartResponse {
    #[serde(default)]
    songs: Vec<PartnerSong>,
}

#[derive(Debug, Deserialize)]
struct PartnerSong {
    title: String,
    artist: String,
    #[serde(default)]
    play_count: u64,
}

#[derive(Debug, Deserialize)]
struct AlbumListResponse {
    #[serde(default)]
    albums: Vec<PartnerAlbum>,
}

#[derive(Debug, Deserialize)]
struct PartnerAlbum {
    id: String,
    title: String,
    #[serde(default)]
    track_count: u64,
    #[serde(default)]
    tracks: Vec<PartnerSong>,
}

#[derive(Debug, Deserialize)]
struct ArtistSummary {
    #[serde(default)]
    followers: u64,
    #[serde(default)]
    total_plays: u64,
    #[serde(default)]
    total_likes: u64,
    #[serde(default)]
    song_count: u64,
}

#[async_trait]
impl PlatformAdapter for RegionalAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<PlatformProfile, AdapterError> {
        let profile: PartnerProfile = self.get("/me", access_token).await?;
        Ok(PlatformProfile {
            id: profile.id,
            email: profile.email,
            display_name: profile.nickname,
        })
    }

    async fn fetch_top_content(&self, access_token: &str) -> Result<TopContent, AdapterError> {
        let chart: SongChartResponse = self.get("/charts/my-songs", access_token).await?;
        let items = chart
            .songs
            .into_iter()
            .enumerate()
            .map(|(i, song)| TopItem {
                rank: i as u32 + 1,
                title: song.title,
                attribution: song.artist,
                metric: song.play_count,
            })
            .collect();

        Ok(TopContent {
            items,
            segments: Vec::new(),
        })
    }

    async fn fetch_collections(
        &self,
        access_token: &str,
    ) -> Result<Vec<Collection>, AdapterError> {
        let list: AlbumListResponse = self.get("/albums", access_token).await?;
        let collections = list
            .albums
            .into_iter()
            .map(|album| {
                let items: Vec<CollectionItem> = album
                    .tracks
                    .iter()
                    .take(COLLECTION_ITEM_CAP)
                    .map(|track| CollectionItem {
                        title: track.title.clone(),
                        attribution: track.artist.clone(),
                        metric: track.play_count,
                    })
                    .collect();

                let item_count = album.track_count.max(album.tracks.len() as u64);
                let more_count = item_count.saturating_sub(items.len() as u64);
                Collection {
                    external_id: album.id,
                    name: album.title,
                    item_count,
                    items,
                    more_count,
                }
            })
            .collect();

        Ok(collections)
    }

    async fn fetch_aggregate_stats(
        &self,
        access_token: &str,
    ) -> Result<AggregateStats, AdapterError> {
        let summary: ArtistSummary = self.get("/artist/summary", access_token).await?;
        Ok(AggregateStats {
            followers: summary.followers,
            total_views: summary.total_plays,
            total_likes: summary.total_likes,
            content_count: summary.song_count,
        })
    }
}
