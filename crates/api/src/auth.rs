//! Bearer-token extractors

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use common::models::AuthSession;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Token from an `Authorization: Bearer <token>` header
pub struct BearerToken(pub String);

/// The signed-in player; rejects with 401 otherwise
pub struct CurrentPlayer(pub AuthSession);

/// The signed-in player, if any
pub struct MaybePlayer(pub Option<AuthSession>);

fn bearer(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        bearer(parts).map(BearerToken).ok_or(ApiError::AuthRequired)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybePlayer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer(parts) else {
            return Ok(MaybePlayer(None));
        };
        let session = state.identity.current(&token).await?;
        Ok(MaybePlayer(session))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentPlayer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let MaybePlayer(session) = MaybePlayer::from_request_parts(parts, state).await?;
        session.map(CurrentPlayer).ok_or(ApiError::AuthRequired)
    }
}
