//! OAuth flow handlers
//!
//! Two endpoints per platform: authorize (returns the provider URL plus the
//! state the client must hold onto) and callback (POST from the SPA, with a
//! GET variant for providers that redirect the browser straight to the API).

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::OptionalSession;
use crate::error::ApiError;
use crate::oauth::{
    build_authorize_url, handle_callback, resolve_redirect_uri, state_for, CallbackParams,
    ConnectFlowError, Purpose,
};
use crate::platforms::Platform;
use crate::server::AppState;

/// Path parameter naming the platform by slug.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlatformPath {
    pub platform: String,
}

fn resolve_platform(state: &AppState, slug: &str) -> Result<Platform, ApiError> {
    state.registry.resolve_slug(slug).map_err(|_| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("platform '{}' not found", slug),
        )
    })
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AuthorizeRequest {
    /// Why the flow is starting; defaults to connect
    #[serde(default)]
    pub purpose: Purpose,
    /// Per-request redirect URI override; defaults to the deployment's
    /// callback URL for the platform
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorizeResponse {
    /// Provider authorization URL to redirect the user to
    pub authorize_url: String,
    /// State the provider will echo; login/signup clients must compare it
    pub state: String,
    /// Redirect URI the flow is bound to
    pub redirect_uri: String,
    pub purpose: Purpose,
}

/// Start an OAuth flow for a platform
///
/// Connect flows require a session and bind the state to the caller's user
/// id. Login and signup flows return a random state for the client to check
/// on return.
#[utoipa::path(
    post,
    path = "/oauth/{platform}/authorize",
    params(
        ("platform" = String, Path, description = "Platform slug (e.g. 'spotify')")
    ),
    request_body = AuthorizeRequest,
    responses(
        (status = 200, description = "Authorization URL generated", body = AuthorizeResponse),
        (status = 401, description = "Connect flow without a session", body = ApiError),
        (status = 404, description = "Unknown platform", body = ApiError),
        (status = 503, description = "Platform not configured", body = ApiError)
    ),
    tag = "oauth"
)]
pub async fn authorize(
    State(state): State<AppState>,
    session: OptionalSession,
    Path(path): Path<PlatformPath>,
    body: Option<Json<AuthorizeRequest>>,
) -> Result<Json<AuthorizeResponse>, ApiError> {
    let platform = resolve_platform(&state, &path.platform)?;
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let purpose = request.purpose;

    let session_user = session.0.map(|s| s.user_id);
    let oauth_state = state_for(purpose, session_user)
        .ok_or_else(|| ApiError::from(ConnectFlowError::SessionRequired))?;

    let platform_config = state.registry.config(platform);
    let redirect_uri = request
        .redirect_uri
        .unwrap_or_else(|| resolve_redirect_uri(&state.config, platform_config, platform));
    let authorize_url = build_authorize_url(platform_config, &redirect_uri, &oauth_state)
        .map_err(|_| ApiError::from(ConnectFlowError::NotConfigured(platform)))?;

    Ok(Json(AuthorizeResponse {
        authorize_url,
        state: oauth_state,
        redirect_uri,
        purpose,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CallbackResponse {
    pub user_id: Uuid,
    pub platform: Platform,
    pub connection_id: Uuid,
    /// External account id the connection now points at
    pub platform_user_id: String,
    /// Session JWT; present for login and signup flows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    pub purpose: Purpose,
}

async fn run_callback(
    state: AppState,
    session: OptionalSession,
    slug: &str,
    params: CallbackParams,
) -> Result<Json<CallbackResponse>, ApiError> {
    let platform = resolve_platform(&state, slug)?;
    let session_user = session.0.map(|s| s.user_id);

    let outcome = handle_callback(
        &state.config,
        &state.registry,
        &state.users(),
        &state.connections(),
        platform,
        params,
        session_user,
    )
    .await?;

    Ok(Json(CallbackResponse {
        user_id: outcome.user_id,
        platform: outcome.platform,
        connection_id: outcome.connection_id,
        platform_user_id: outcome.platform_user_id,
        session_token: outcome.session_token,
        purpose: outcome.purpose,
    }))
}

/// Complete an OAuth flow (client-relayed)
///
/// The SPA receives the provider redirect, verifies the state for
/// login/signup flows, then relays code and state here.
#[utoipa::path(
    post,
    path = "/oauth/{platform}/callback",
    params(
        ("platform" = String, Path, description = "Platform slug (e.g. 'spotify')")
    ),
    responses(
        (status = 200, description = "Flow completed, connection upserted", body = CallbackResponse),
        (status = 400, description = "Provider denied or parameters missing", body = ApiError),
        (status = 401, description = "Connect flow without a session", body = ApiError),
        (status = 404, description = "Unknown platform or no matching account", body = ApiError),
        (status = 502, description = "Token exchange or profile fetch failed", body = ApiError),
        (status = 503, description = "Platform not configured", body = ApiError)
    ),
    tag = "oauth"
)]
pub async fn callback_post(
    State(state): State<AppState>,
    session: OptionalSession,
    Path(path): Path<PlatformPath>,
    payload: Result<Json<CallbackParams>, JsonRejection>,
) -> Result<Json<CallbackResponse>, ApiError> {
    // Malformed bodies get the problem+json shape, not axum's plain text
    let Json(params) = payload.map_err(ApiError::from)?;
    run_callback(state, session, &path.platform, params).await
}

/// Complete an OAuth flow (provider redirect)
///
/// Same semantics as the POST variant, for providers configured to redirect
/// the browser directly to the API with query parameters.
#[utoipa::path(
    get,
    path = "/oauth/{platform}/callback",
    params(
        ("platform" = String, Path, description = "Platform slug (e.g. 'spotify')"),
        CallbackParams
    ),
    responses(
        (status = 200, description = "Flow completed, connection upserted", body = CallbackResponse),
        (status = 400, description = "Provider denied or parameters missing", body = ApiError),
        (status = 502, description = "Token exchange or profile fetch failed", body = ApiError)
    ),
    tag = "oauth"
)]
pub async fn callback_get(
    State(state): State<AppState>,
    session: OptionalSession,
    Path(path): Path<PlatformPath>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<CallbackResponse>, ApiError> {
    run_callback(state, session, &path.platform, params).await
}
