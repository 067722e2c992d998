//! Platform registry
//!
//! Static per-platform OAuth/API configuration plus the adapter lookup table
//! keyed by [`Platform`]. The registry is built once from [`AppConfig`] and
//! carried in application state; a platform whose client credentials are not
//! configured fails closed before any network call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, PlatformEnv};

use super::{Platform, PlatformAdapter, RegionalAdapter, SpotifyAdapter, YouTubeAdapter};

/// Error type for registry operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("platform '{slug}' not found")]
    UnknownPlatform { slug: String },
    #[error("platform '{platform}' is not configured; set client credentials")]
    NotConfigured { platform: Platform },
}

/// How the platform's token endpoint expects client authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenEndpointAuth {
    /// Client id/secret via HTTP Basic (Spotify style)
    Basic,
    /// Client id/secret as form body fields
    Form,
}

/// Static OAuth configuration for one platform.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub platform: Platform,
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: String,
    pub token_auth: TokenEndpointAuth,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Explicit redirect URI override from the environment
    pub redirect_override: Option<String>,
}

impl PlatformConfig {
    /// Returns the client credential pair, failing closed when either half is
    /// missing from the environment.
    pub fn credentials(&self) -> Result<(&str, &str), RegistryError> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(RegistryError::NotConfigured {
                platform: self.platform,
            }),
        }
    }

    /// Whether both client credentials are present.
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

struct PlatformEntry {
    config: PlatformConfig,
    adapter: Arc<dyn PlatformAdapter>,
}

/// Registry of platform configurations and adapters.
pub struct PlatformRegistry {
    entries: HashMap<Platform, PlatformEntry>,
    http: reqwest::Client,
}

impl PlatformRegistry {
    /// Build the registry from application configuration. A shared HTTP
    /// client with the configured provider timeout backs every adapter.
    pub fn from_config(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_secs))
            .build()
            .unwrap_or_default();

        let mut entries = HashMap::new();

        let spotify = platform_config(
            Platform::Spotify,
            &config.spotify,
            "https://accounts.spotify.com/authorize",
            "https://accounts.spotify.com/api/token",
            "user-read-email user-read-private user-top-read playlist-read-private",
            TokenEndpointAuth::Basic,
        );
        let spotify_api = config
            .spotify
            .api_base
            .clone()
            .unwrap_or_else(|| "https://api.spotify.com".to_string());
        entries.insert(
            Platform::Spotify,
            PlatformEntry {
                config: spotify,
                adapter: Arc::new(SpotifyAdapter::new(client.clone(), spotify_api)),
            },
        );

        let youtube = platform_config(
            Platform::Youtube,
            &config.youtube,
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
            "https://www.googleapis.com/auth/youtube.readonly https://www.googleapis.com/auth/userinfo.email",
            TokenEndpointAuth::Form,
        );
        let youtube_api = config
            .youtube
            .api_base
            .clone()
            .unwrap_or_else(|| "https://www.googleapis.com".to_string());
        entries.insert(
            Platform::Youtube,
            PlatformEntry {
                config: youtube,
                adapter: Arc::new(YouTubeAdapter::new(client.clone(), youtube_api)),
            },
        );

        for (platform, env, authorize, token, api) in [
            (
                Platform::Melon,
                &config.melon,
                "https://auth.melon.com/oauth/authorize",
                "https://auth.melon.com/oauth/token",
                "https://api.melon.com/v1",
            ),
            (
                Platform::Genie,
                &config.genie,
                "https://auth.genie.co.kr/oauth/authorize",
                "https://auth.genie.co.kr/oauth/token",
                "https://api.genie.co.kr/v1",
            ),
            (
                Platform::Bugs,
                &config.bugs,
                "https://auth.bugs.co.kr/oauth/authorize",
                "https://auth.bugs.co.kr/oauth/token",
                "https://api.bugs.co.kr/v1",
            ),
        ] {
            let cfg = platform_config(
                platform,
                env,
                authorize,
                token,
                "artist.read stats.read",
                TokenEndpointAuth::Form,
            );
            let api_base = env.api_base.clone().unwrap_or_else(|| api.to_string());
            entries.insert(
                platform,
                PlatformEntry {
                    config: cfg,
                    adapter: Arc::new(RegionalAdapter::new(platform, client.clone(), api_base)),
                },
            );
        }

        Self {
            entries,
            http: client,
        }
    }

    /// The shared HTTP client, also used for token exchanges.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Get the static configuration for a platform.
    pub fn config(&self, platform: Platform) -> &PlatformConfig {
        // Every Platform variant is inserted in from_config
        &self.entries[&platform].config
    }

    /// Get the adapter for a platform.
    pub fn adapter(&self, platform: Platform) -> Arc<dyn PlatformAdapter> {
        Arc::clone(&self.entries[&platform].adapter)
    }

    /// Resolve a URL slug into a known platform.
    pub fn resolve_slug(&self, slug: &str) -> Result<Platform, RegistryError> {
        Platform::from_slug(slug).ok_or_else(|| RegistryError::UnknownPlatform {
            slug: slug.to_string(),
        })
    }

    /// Platforms with complete client credentials, in registry order.
    pub fn configured_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.entries[p].config.is_configured())
            .collect()
    }
}

fn platform_config(
    platform: Platform,
    env: &PlatformEnv,
    authorize_default: &str,
    token_default: &str,
    scopes: &str,
    token_auth: TokenEndpointAuth,
) -> PlatformConfig {
    let authorize_url = match &env.authorize_base {
        Some(base) => format!("{}/oauth/authorize", base.trim_end_matches('/')),
        None => authorize_default.to_string(),
    };
    let token_url = match &env.token_base {
        Some(base) => format!("{}/oauth/token", base.trim_end_matches('/')),
        None => token_default.to_string(),
    };

    PlatformConfig {
        platform,
        authorize_url,
        token_url,
        scopes: scopes.to_string(),
        token_auth,
        client_id: env.client_id.clone(),
        client_secret: env.client_secret.clone(),
        redirect_override: env.redirect_uri.clone(),
    }
}
