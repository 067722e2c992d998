//! Session tokens and request extractors
//!
//! Login and signup callbacks mint an HS256 JWT carrying the user id.
//! Handlers take a [`Session`] (required) or [`OptionalSession`] extractor;
//! a missing or invalid bearer token maps to a problem+json 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{unauthorized, ApiError};
use crate::server::AppState;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("session token is invalid or expired")]
    InvalidToken,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id
    sub: Uuid,
    iat: i64,
    exp: i64,
}

/// Mint a session token for the user, valid for the configured TTL.
pub fn issue_session(config: &AppConfig, user_id: Uuid) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.session_ttl_hours as i64)).timestamp(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_signing_key.as_bytes()),
    )?)
}

/// Verify a session token and return the user id it was minted for.
pub fn verify_session(config: &AppConfig, token: &str) -> Result<Uuid, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.session_signing_key.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::InvalidToken)?;
    Ok(data.claims.sub)
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| unauthorized(None))?;
        let user_id = verify_session(&state.config, token)
            .map_err(|_| unauthorized(Some("Invalid session token")))?;
        Ok(Session { user_id })
    }
}

/// Like [`Session`] but tolerates an absent header. An invalid token is
/// still rejected rather than silently treated as anonymous.
#[derive(Debug, Clone, Copy)]
pub struct OptionalSession(pub Option<Session>);

impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(OptionalSession(None)),
            Some(token) => {
                let user_id = verify_session(&state.config, token)
                    .map_err(|_| unauthorized(Some("Invalid session token")))?;
                Ok(OptionalSession(Some(Session { user_id })))
            }
        }
    }
}
