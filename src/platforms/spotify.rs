//! Spotify adapter
//!
//! Normalizes the Spotify Web API: the current user's profile, global top
//! tracks ranked by popularity score, and playlists with a per-track
//! popularity breakdown for the first few tracks of each.

use async_trait::async_trait;
use serde::Deserialize;

use super::adapter::{
    get_json, AdapterError, AggregateStats, Collection, CollectionItem, PlatformAdapter,
    PlatformProfile, TopContent, TopItem, COLLECTION_ITEM_CAP,
};
use super::Platform;

/// How many top tracks to request per sync.
const TOP_TRACK_LIMIT: usize = 10;

/// How many playlists to enumerate per sync.
const PLAYLIST_LIMIT: usize = 20;

pub struct SpotifyAdapter {
    client: reqwest::Client,
    api_base: String,
}

impl SpotifyAdapter {
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
        get_json(&self.client, Platform::Spotify, &url, access_token).await
    }
}

#[derive(Debug, Deserialize)]
struct SpotifyProfile {
    id: String,
    email: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    followers: SpotifyFollowers,
}

#[derive(Debug, Default, Deserialize)]
struct SpotifyFollowers {
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct TopTracksPage {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    name: String,
    #[serde(default)]
    popularity: u64,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistsPage {
    #[serde(default)]
    items: Vec<SpotifyPlaylist>,
}

#[derive(Debug, Deserialize)]
struct SpotifyPlaylist {
    id: String,
    name: String,
    tracks: PlaylistTrackRef,
}

#[derive(Debug, Deserialize)]
struct PlaylistTrackRef {
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct PlaylistTracksPage {
    #[serde(default)]
    items: Vec<PlaylistEntry>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    // Null for episodes and tracks removed from the catalog
    track: Option<SpotifyTrack>,
}

fn attribution(artists: &[SpotifyArtist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl PlatformAdapter for SpotifyAdapter {
    fn platform(&self) -> Platform {
        Platform::Spotify
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<PlatformProfile, AdapterError> {
        let profile: SpotifyProfile = self.get("/v1/me", access_token).await?;
        Ok(PlatformProfile {
            id: profile.id,
            email: profile.email,
            display_name: profile.display_name,
        })
    }

    async fn fetch_top_content(&self, access_token: &str) -> Result<TopContent, AdapterError> {
        let page: TopTracksPage = self
            .get(
                &format!("/v1/me/top/tracks?limit={TOP_TRACK_LIMIT}"),
                access_token,
            )
            .await?;

        let items = page
            .items
            .into_iter()
            .enumerate()
            .map(|(i, track)| TopItem {
                rank: i as u32 + 1,
                title: track.name,
                attribution: attribution(&track.artists),
                metric: track.popularity,
            })
            .collect();

        // Spotify has no music/video split, so no segments.
        Ok(TopContent {
            items,
            segments: Vec::new(),
        })
    }

    async fn fetch_collections(
        &self,
        access_token: &str,
    ) -> Result<Vec<Collection>, AdapterError> {
        let page: PlaylistsPage = self
            .get(
                &format!("/v1/me/playlists?limit={PLAYLIST_LIMIT}"),
                access_token,
            )
            .await?;

        let mut collections = Vec::with_capacity(page.items.len());
        for playlist in page.items {
            let tracks: PlaylistTracksPage = self
                .get(
                    &format!(
                        "/v1/playlists/{}/tracks?limit={COLLECTION_ITEM_CAP}",
                        playlist.id
                    ),
                    access_token,
                )
                .await?;

            let items: Vec<CollectionItem> = tracks
                .items
                .into_iter()
                .filter_map(|entry| entry.track)
                .take(COLLECTION_ITEM_CAP)
                .map(|track| CollectionItem {
                    title: track.name,
                    attribution: attribution(&track.artists),
                    metric: track.popularity,
                })
                .collect();

            let item_count = playlist.tracks.total;
            let more_count = item_count.saturating_sub(items.len() as u64);
            collections.push(Collection {
                external_id: playlist.id,
                name: playlist.name,
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
        let profile: SpotifyProfile = self.get("/v1/me", access_token).await?;
        // Spotify exposes no view or like totals for an account.
        Ok(AggregateStats {
            followers: profile.followers.total,
            ..AggregateStats::default()
        })
    }
}
