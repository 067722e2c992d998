//! OAuth authorization-code flow
//!
//! Covers the two server-side halves of the flow: building the provider
//! authorization URL (with purpose-dependent state) and handling the
//! callback through token exchange, profile fetch, account resolution and
//! connection upsert.

pub mod callback;
pub mod exchange;

pub use callback::{handle_callback, CallbackOutcome, CallbackParams, ConnectFlowError};
pub use exchange::exchange_code;

use base64_url::encode as b64url_encode;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::platforms::{Platform, PlatformConfig, RegistryError};

/// Why the client is starting an OAuth flow. Connect links a platform to an
/// existing session; login and signup resolve the account from the external
/// profile's email.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Login,
    Signup,
    #[default]
    Connect,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Login => "login",
            Purpose::Signup => "signup",
            Purpose::Connect => "connect",
        }
    }
}

/// State carried through the provider round trip.
///
/// Connect flows put the caller's user id in the state so the callback can
/// attribute the connection. Login and signup flows get a random token the
/// client is expected to compare on return; the server keeps no record of it.
pub fn state_for(purpose: Purpose, session_user: Option<Uuid>) -> Option<String> {
    match purpose {
        Purpose::Connect => session_user.map(|id| id.to_string()),
        Purpose::Login | Purpose::Signup => Some(generate_state_token()),
    }
}

/// 32 bytes of CSPRNG output, base64url without padding.
pub fn generate_state_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    b64url_encode(&bytes)
}

/// The redirect URI registered with the provider for this deployment:
/// an explicit per-platform override, else the public origin (falling back
/// to a localhost default) plus the callback path.
pub fn resolve_redirect_uri(
    app_config: &AppConfig,
    platform_config: &PlatformConfig,
    platform: Platform,
) -> String {
    if let Some(uri) = &platform_config.redirect_override {
        return uri.clone();
    }
    let origin = app_config
        .public_origin
        .as_deref()
        .unwrap_or("http://localhost:8080");
    format!(
        "{}/oauth/{}/callback",
        origin.trim_end_matches('/'),
        platform.as_slug()
    )
}

/// Build the provider authorization URL. Fails closed when the platform's
/// client credentials are missing.
pub fn build_authorize_url(
    platform_config: &PlatformConfig,
    redirect_uri: &str,
    state: &str,
) -> Result<String, RegistryError> {
    let (client_id, _) = platform_config.credentials()?;

    // authorize_url is validated shape by construction in the registry
    let mut url = Url::parse(&platform_config.authorize_url).map_err(|_| {
        RegistryError::NotConfigured {
            platform: platform_config.platform,
        }
    })?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &platform_config.scopes)
        .append_pair("state", state);
    Ok(url.into())
}
