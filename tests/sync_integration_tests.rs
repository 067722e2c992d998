//! Integration tests for the sync, connections and disconnect endpoints

use anyhow::Result;
use reqwest::StatusCode;
use sea_orm::EntityTrait;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stagesync::auth::issue_session;
use stagesync::models::connection::Entity as Connection;
use stagesync::platforms::Platform;

#[path = "test_utils/mod.rs"]
mod test_utils;

const SPOTIFY_TOKEN: &str = "at-spotify-sync";

async fn mock_spotify_data_api(server: &MockServer) {
    let bearer = format!("Bearer {SPOTIFY_TOKEN}");

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "spotify-artist-1",
            "email": "artist@example.com",
            "display_name": "Test Artist",
            "followers": { "total": 5230 }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .and(header("authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "name": "Neon Night", "popularity": 78, "artists": [{ "name": "Test Artist" }] },
                { "name": "Paper Moon", "popularity": 65, "artists": [{ "name": "Test Artist" }] }
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/me/playlists"))
        .and(header("authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "pl-1", "name": "Fan Favorites", "tracks": { "total": 8 } }
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/playlists/pl-1/tracks"))
        .and(header("authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "track": { "name": "Neon Night", "popularity": 78, "artists": [{ "name": "Test Artist" }] } },
                { "track": { "name": "Paper Moon", "popularity": 65, "artists": [{ "name": "Test Artist" }] } },
                { "track": null },
                { "track": { "name": "Glass River", "popularity": 50, "artists": [{ "name": "Test Artist" }] } }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn spotify_sync_returns_report_and_advances_last_synced_at() -> Result<()> {
    let mock = MockServer::start().await;
    mock_spotify_data_api(&mock).await;

    let config = test_utils::test_config(&mock.uri());
    let (url, db, server) = test_utils::spawn_test_app(config.clone()).await?;

    let user_id = test_utils::create_test_user(&db, "artist@example.com").await?;
    test_utils::create_test_connection(&db, user_id, Platform::Spotify, SPOTIFY_TOKEN).await?;

    let token = issue_session(&config, user_id)?;
    let response = reqwest::Client::new()
        .post(format!("{url}/platforms/spotify/sync"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let report: Value = response.json().await?;
    assert_eq!(report["platform"], json!("spotify"));

    let items = report["top_content"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["rank"], json!(1));
    assert_eq!(items[0]["title"], json!("Neon Night"));
    assert_eq!(items[0]["metric"], json!(78));
    assert!(report["top_content"]["segments"].as_array().unwrap().is_empty());

    let collections = report["collections"].as_array().unwrap();
    assert_eq!(collections.len(), 1);
    assert_eq!(collections[0]["name"], json!("Fan Favorites"));
    assert_eq!(collections[0]["item_count"], json!(8));
    // One null track entry is dropped from the enumeration
    assert_eq!(collections[0]["items"].as_array().unwrap().len(), 3);
    assert_eq!(collections[0]["more_count"], json!(5));

    // Spotify exposes followers only; other totals are zero-filled
    assert_eq!(report["aggregate"]["followers"], json!(5230));
    assert_eq!(report["aggregate"]["total_views"], json!(0));
    assert_eq!(report["aggregate"]["total_likes"], json!(0));

    let row = Connection::find().one(db.as_ref()).await?.unwrap();
    assert!(row.last_synced_at.is_some());

    server.shutdown().await
}

#[tokio::test]
async fn melon_sync_normalizes_partner_payloads() -> Result<()> {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/charts/my-songs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "songs": [
                { "title": "첫눈", "artist": "Test Artist", "play_count": 120345 },
                { "title": "여름밤", "artist": "Test Artist", "play_count": 98000 }
            ]
        })))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/albums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "albums": [
                {
                    "id": "alb-1",
                    "title": "First Light",
                    "track_count": 2,
                    "tracks": [
                        { "title": "첫눈", "artist": "Test Artist", "play_count": 120345 },
                        { "title": "여름밤", "artist": "Test Artist", "play_count": 98000 }
                    ]
                }
            ]
        })))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/artist/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "followers": 4300,
            "total_plays": 218345
        })))
        .mount(&mock)
        .await;

    let config = test_utils::test_config(&mock.uri());
    let (url, db, server) = test_utils::spawn_test_app(config.clone()).await?;

    let user_id = test_utils::create_test_user(&db, "artist@example.com").await?;
    test_utils::create_test_connection(&db, user_id, Platform::Melon, "at-melon").await?;

    let token = issue_session(&config, user_id)?;
    let response = reqwest::Client::new()
        .post(format!("{url}/platforms/melon/sync"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let report: Value = response.json().await?;
    assert_eq!(report["platform"], json!("melon"));
    assert_eq!(report["top_content"]["items"][0]["title"], json!("첫눈"));
    assert_eq!(report["aggregate"]["followers"], json!(4300));
    assert_eq!(report["aggregate"]["total_views"], json!(218345));
    // Fields the partner API omits stay zero
    assert_eq!(report["aggregate"]["total_likes"], json!(0));
    assert_eq!(report["aggregate"]["content_count"], json!(0));

    server.shutdown().await
}

#[tokio::test]
async fn sync_without_connection_is_not_connected_and_skips_upstream() -> Result<()> {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;

    let config = test_utils::test_config(&mock.uri());
    let (url, db, server) = test_utils::spawn_test_app(config.clone()).await?;

    let user_id = test_utils::create_test_user(&db, "artist@example.com").await?;
    let token = issue_session(&config, user_id)?;

    let response = reqwest::Client::new()
        .post(format!("{url}/platforms/spotify/sync"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await?;
    assert_eq!(body["code"], json!("NOT_CONNECTED"));

    server.shutdown().await
}

#[tokio::test]
async fn sync_requires_a_session() -> Result<()> {
    let mock = MockServer::start().await;
    let config = test_utils::test_config(&mock.uri());
    let (url, _db, server) = test_utils::spawn_test_app(config).await?;

    let response = reqwest::Client::new()
        .post(format!("{url}/platforms/spotify/sync"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    server.shutdown().await
}

#[tokio::test]
async fn expired_token_maps_to_upstream_auth_failure_and_keeps_last_synced_at() -> Result<()> {
    let mock = MockServer::start().await;
    for endpoint in ["/v1/me", "/v1/me/top/tracks", "/v1/me/playlists"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({
                    "error": { "status": 401, "message": "The access token expired" }
                })),
            )
            .mount(&mock)
            .await;
    }

    let config = test_utils::test_config(&mock.uri());
    let (url, db, server) = test_utils::spawn_test_app(config.clone()).await?;

    let user_id = test_utils::create_test_user(&db, "artist@example.com").await?;
    test_utils::create_test_connection(&db, user_id, Platform::Spotify, "stale-token").await?;

    let token = issue_session(&config, user_id)?;
    let response = reqwest::Client::new()
        .post(format!("{url}/platforms/spotify/sync"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body: Value = response.json().await?;
    assert_eq!(body["code"], json!("UPSTREAM_AUTH_FAILED"));

    // A failed pass must not advance the sync bookkeeping
    let row = Connection::find().one(db.as_ref()).await?.unwrap();
    assert!(row.last_synced_at.is_none());

    server.shutdown().await
}

#[tokio::test]
async fn disconnect_deactivates_and_keeps_the_row() -> Result<()> {
    let mock = MockServer::start().await;
    let config = test_utils::test_config(&mock.uri());
    let (url, db, server) = test_utils::spawn_test_app(config.clone()).await?;

    let user_id = test_utils::create_test_user(&db, "artist@example.com").await?;
    test_utils::create_test_connection(&db, user_id, Platform::Spotify, SPOTIFY_TOKEN).await?;

    let token = issue_session(&config, user_id)?;
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{url}/connections/spotify"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["disconnected"], json!(true));

    // Row survives, flagged inactive
    let rows = Connection::find().all(db.as_ref()).await?;
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_active);

    // The dashboard listing no longer shows it
    let response = client
        .get(format!("{url}/connections"))
        .bearer_auth(&token)
        .send()
        .await?;
    let list: Value = response.json().await?;
    assert!(list["connections"].as_array().unwrap().is_empty());

    // A second disconnect reports not connected
    let response = client
        .delete(format!("{url}/connections/spotify"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], json!("NOT_CONNECTED"));

    // And syncing the disconnected platform fails the same way
    let response = client
        .post(format!("{url}/platforms/spotify/sync"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.shutdown().await
}

#[tokio::test]
async fn connections_listing_reflects_active_links() -> Result<()> {
    let mock = MockServer::start().await;
    let config = test_utils::test_config(&mock.uri());
    let (url, db, server) = test_utils::spawn_test_app(config.clone()).await?;

    let user_id = test_utils::create_test_user(&db, "artist@example.com").await?;
    test_utils::create_test_connection(&db, user_id, Platform::Spotify, "at-1").await?;
    test_utils::create_test_connection(&db, user_id, Platform::Youtube, "at-2").await?;

    // Another user's links must not leak in
    let other = test_utils::create_test_user(&db, "other@example.com").await?;
    test_utils::create_test_connection(&db, other, Platform::Melon, "at-3").await?;

    let token = issue_session(&config, user_id)?;
    let response = reqwest::Client::new()
        .get(format!("{url}/connections"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let list: Value = response.json().await?;
    let connections = list["connections"].as_array().unwrap();
    assert_eq!(connections.len(), 2);
    let platforms: Vec<&str> = connections
        .iter()
        .map(|c| c["platform"].as_str().unwrap())
        .collect();
    assert!(platforms.contains(&"spotify"));
    assert!(platforms.contains(&"youtube"));

    server.shutdown().await
}

#[tokio::test]
async fn youtube_sync_partitions_uploads_into_music_and_video_buckets() -> Result<()> {
    let mock = MockServer::start().await;

    // One channels mock serves both the contentDetails and statistics lookups
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "contentDetails": { "relatedPlaylists": { "uploads": "UU-uploads" } },
                "statistics": {
                    "subscriberCount": "15000",
                    "viewCount": "2500000",
                    "videoCount": "34"
                }
            }]
        })))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/youtube/v3/playlistItems"))
        .and(wiremock::matchers::query_param("playlistId", "UU-uploads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "snippet": { "title": "Neon Night (MV)", "resourceId": { "videoId": "v1" } } },
                { "snippet": { "title": "Tour vlog", "resourceId": { "videoId": "v2" } } },
                { "snippet": { "title": "Paper Moon (MV)", "resourceId": { "videoId": "v3" } } }
            ]
        })))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/youtube/v3/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "snippet": { "title": "Neon Night (MV)", "channelTitle": "Test Artist", "categoryId": "10" },
                    "statistics": { "viewCount": "800000" }
                },
                {
                    "snippet": { "title": "Tour vlog", "channelTitle": "Test Artist", "categoryId": "22" },
                    "statistics": { "viewCount": "150000" }
                },
                {
                    "snippet": { "title": "Paper Moon (MV)", "channelTitle": "Test Artist", "categoryId": "10" },
                    "statistics": { "viewCount": "1200000" }
                }
            ]
        })))
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/youtube/v3/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&mock)
        .await;

    let config = test_utils::test_config(&mock.uri());
    let (url, db, server) = test_utils::spawn_test_app(config.clone()).await?;

    let user_id = test_utils::create_test_user(&db, "artist@example.com").await?;
    test_utils::create_test_connection(&db, user_id, Platform::Youtube, "at-youtube").await?;

    let token = issue_session(&config, user_id)?;
    let response = reqwest::Client::new()
        .post(format!("{url}/platforms/youtube/sync"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let report: Value = response.json().await?;
    let segments = report["top_content"]["segments"].as_array().unwrap();
    assert_eq!(segments.len(), 2);

    let music = &segments[0];
    assert_eq!(music["label"], json!("music"));
    assert_eq!(music["total_metric"], json!(2_000_000));
    assert_eq!(music["items"][0]["title"], json!("Paper Moon (MV)"));
    assert_eq!(music["items"][0]["rank"], json!(1));
    assert_eq!(music["items"][1]["title"], json!("Neon Night (MV)"));

    let video = &segments[1];
    assert_eq!(video["label"], json!("video"));
    assert_eq!(video["total_metric"], json!(150_000));
    assert_eq!(video["items"].as_array().unwrap().len(), 1);

    // Channel statistics drive the aggregate; likes have no account total
    assert_eq!(report["aggregate"]["followers"], json!(15000));
    assert_eq!(report["aggregate"]["total_views"], json!(2_500_000));
    assert_eq!(report["aggregate"]["total_likes"], json!(0));
    assert_eq!(report["aggregate"]["content_count"], json!(34));

    server.shutdown().await
}
