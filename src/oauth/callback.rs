//! OAuth callback state machine
//!
//! Drives a callback from parameter validation through token exchange,
//! profile fetch, account resolution and connection upsert. Each stage has
//! a dedicated error so handlers map failures onto the problem+json
//! taxonomy without inspecting strings.

use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::issue_session;
use crate::config::AppConfig;
use crate::error::{upstream_error, ApiError};
use crate::platforms::{AdapterError, Platform, PlatformRegistry};
use crate::repositories::{ConnectionRepository, UserRepository};

use super::exchange::{exchange_code, ExchangeError};
use super::{resolve_redirect_uri, Purpose};

/// Query/body parameters the provider (and client) send to the callback.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CallbackParams {
    /// Authorization code, absent when the user denied consent
    pub code: Option<String>,
    /// State echoed by the provider
    pub state: Option<String>,
    /// Provider error code (e.g. "access_denied")
    pub error: Option<String>,
    /// Flow purpose; defaults to connect
    #[serde(default)]
    pub purpose: Purpose,
    /// Redirect URI the flow was started with, when it overrode the default
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

/// Successful callback result.
#[derive(Debug)]
pub struct CallbackOutcome {
    pub user_id: Uuid,
    pub platform: Platform,
    pub connection_id: Uuid,
    pub platform_user_id: String,
    /// Minted for login and signup flows only
    pub session_token: Option<String>,
    pub purpose: Purpose,
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectFlowError {
    #[error("platform {0} is not configured")]
    NotConfigured(Platform),

    #[error("provider denied authorization: {error}")]
    ProviderDenied { error: String },

    #[error("callback is missing the code or state parameter")]
    StateOrCodeMissing,

    #[error("token exchange failed")]
    TokenExchange(#[source] ExchangeError),

    #[error("profile fetch failed")]
    ProfileFetch(#[source] AdapterError),

    #[error("no account matches the external profile")]
    AccountNotFound { email: Option<String> },

    #[error("connect flows require an authenticated session")]
    SessionRequired,

    #[error("failed to persist the connection")]
    Persistence(#[source] anyhow::Error),
}

impl From<ConnectFlowError> for ApiError {
    fn from(error: ConnectFlowError) -> Self {
        match error {
            ConnectFlowError::NotConfigured(platform) => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "PLATFORM_NOT_CONFIGURED",
                &format!("Platform {} is not configured on this deployment", platform),
            ),
            ConnectFlowError::ProviderDenied { error } => ApiError::new(
                StatusCode::BAD_REQUEST,
                "PROVIDER_DENIED",
                "The provider denied the authorization request",
            )
            .with_details(json!({ "provider_error": error })),
            ConnectFlowError::StateOrCodeMissing => ApiError::new(
                StatusCode::BAD_REQUEST,
                "STATE_OR_CODE_MISSING",
                "Callback must include both code and state",
            ),
            ConnectFlowError::TokenExchange(source) => match source {
                ExchangeError::Rejected {
                    platform,
                    status,
                    snippet,
                } => upstream_error(
                    "TOKEN_EXCHANGE_FAILED",
                    platform.to_string(),
                    status,
                    Some(snippet),
                ),
                ExchangeError::NotConfigured(_) => ApiError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PLATFORM_NOT_CONFIGURED",
                    "Platform credentials are not configured",
                ),
                other => {
                    tracing::error!("Token exchange failed: {:?}", other);
                    ApiError::new(
                        StatusCode::BAD_GATEWAY,
                        "TOKEN_EXCHANGE_FAILED",
                        "Token exchange with the platform failed",
                    )
                }
            },
            ConnectFlowError::ProfileFetch(source) => {
                let status = source.upstream_status();
                tracing::error!("Profile fetch failed: {:?}", source);
                let mut api = ApiError::new(
                    StatusCode::BAD_GATEWAY,
                    "PROFILE_FETCH_FAILED",
                    "Could not fetch the external profile",
                );
                if let Some(status) = status {
                    api = api.with_details(json!({ "upstream_status": status }));
                }
                api
            }
            ConnectFlowError::AccountNotFound { email } => ApiError::new(
                StatusCode::NOT_FOUND,
                "ACCOUNT_NOT_FOUND",
                "No account matches the external profile",
            )
            .with_details(json!({ "email": email })),
            ConnectFlowError::SessionRequired => crate::error::unauthorized(Some(
                "Connect flows require an authenticated session",
            )),
            ConnectFlowError::Persistence(source) => source.into(),
        }
    }
}

/// Run the callback state machine for one platform.
///
/// `session_user` is the authenticated caller, when one exists. Connect
/// attributes the connection to the caller; login and signup resolve the
/// account from the external profile's email and mint a session token.
pub async fn handle_callback(
    config: &AppConfig,
    registry: &PlatformRegistry,
    users: &UserRepository,
    connections: &ConnectionRepository,
    platform: Platform,
    params: CallbackParams,
    session_user: Option<Uuid>,
) -> Result<CallbackOutcome, ConnectFlowError> {
    if let Some(error) = params.error {
        return Err(ConnectFlowError::ProviderDenied { error });
    }
    let (Some(code), Some(_state)) = (params.code, params.state) else {
        return Err(ConnectFlowError::StateOrCodeMissing);
    };

    let platform_config = registry.config(platform);
    if !platform_config.is_configured() {
        return Err(ConnectFlowError::NotConfigured(platform));
    }

    // The token exchange must echo the redirect URI the flow started with
    let redirect_uri = params
        .redirect_uri
        .unwrap_or_else(|| resolve_redirect_uri(config, platform_config, platform));
    let grant = exchange_code(registry.http_client(), platform_config, &code, &redirect_uri)
        .await
        .map_err(ConnectFlowError::TokenExchange)?;

    let adapter = registry.adapter(platform);
    let profile = adapter
        .fetch_profile(&grant.access_token)
        .await
        .map_err(ConnectFlowError::ProfileFetch)?;

    let user_id = match params.purpose {
        Purpose::Connect => session_user.ok_or(ConnectFlowError::SessionRequired)?,
        Purpose::Login => {
            let email = profile
                .email
                .clone()
                .ok_or(ConnectFlowError::AccountNotFound { email: None })?;
            users
                .find_by_email(&email)
                .await
                .map_err(ConnectFlowError::Persistence)?
                .ok_or(ConnectFlowError::AccountNotFound { email: Some(email) })?
                .id
        }
        Purpose::Signup => {
            let email = profile
                .email
                .clone()
                .ok_or(ConnectFlowError::AccountNotFound { email: None })?;
            let display_name = profile.display_name.clone().unwrap_or_else(|| email.clone());
            // An existing account with this email turns signup into login
            users
                .find_or_create(&email, &display_name)
                .await
                .map_err(ConnectFlowError::Persistence)?
                .id
        }
    };

    let connection = connections
        .upsert_active(user_id, platform, &profile.id, &grant)
        .await
        .map_err(ConnectFlowError::Persistence)?;

    let session_token = match params.purpose {
        Purpose::Connect => None,
        Purpose::Login | Purpose::Signup => Some(
            issue_session(config, user_id)
                .map_err(|e| ConnectFlowError::Persistence(e.into()))?,
        ),
    };

    tracing::info!(
        user_id = %user_id,
        platform = %platform,
        purpose = params.purpose.as_str(),
        "OAuth callback completed"
    );

    Ok(CallbackOutcome {
        user_id,
        platform,
        connection_id: connection.id,
        platform_user_id: profile.id,
        session_token,
        purpose: params.purpose,
    })
}
