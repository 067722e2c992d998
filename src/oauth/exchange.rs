//! Authorization-code token exchange
//!
//! Posts the code back to the platform's token endpoint, sending client
//! credentials via HTTP Basic or form fields as the platform requires, and
//! converts the relative `expires_in` into an absolute expiry. Tokens are
//! stored as granted; there is no refresh path.

use chrono::{Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::error::truncate_snippet;
use crate::platforms::{Platform, PlatformConfig, RegistryError, TokenEndpointAuth};
use crate::repositories::connection::TokenGrant;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    NotConfigured(#[from] RegistryError),

    #[error("network error during {platform} token exchange: {source}")]
    Network {
        platform: Platform,
        #[source]
        source: reqwest::Error,
    },

    /// The token endpoint answered with a non-2xx; the snippet is bounded.
    #[error("{platform} token endpoint returned {status}: {snippet}")]
    Rejected {
        platform: Platform,
        status: u16,
        snippet: String,
    },

    #[error("malformed token response from {platform}: {details}")]
    Malformed { platform: Platform, details: String },
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code(
    client: &reqwest::Client,
    platform_config: &PlatformConfig,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenGrant, ExchangeError> {
    let platform = platform_config.platform;
    let (client_id, client_secret) = platform_config.credentials()?;

    let mut form: Vec<(&str, &str)> = vec![
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", redirect_uri),
    ];

    let mut request = client.post(&platform_config.token_url);
    match platform_config.token_auth {
        TokenEndpointAuth::Basic => {
            request = request.basic_auth(client_id, Some(client_secret));
        }
        TokenEndpointAuth::Form => {
            form.push(("client_id", client_id));
            form.push(("client_secret", client_secret));
        }
    }

    let response = request
        .form(&form)
        .send()
        .await
        .map_err(|source| ExchangeError::Network { platform, source })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ExchangeError::Rejected {
            platform,
            status: status.as_u16(),
            snippet: truncate_snippet(&body),
        });
    }

    let tokens: TokenResponse =
        response
            .json()
            .await
            .map_err(|err| ExchangeError::Malformed {
                platform,
                details: err.to_string(),
            })?;

    Ok(TokenGrant {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_expires_at: tokens
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    })
}
