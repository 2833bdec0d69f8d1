//! Sign-up, login and session routes

use axum::{extract::State, http::StatusCode, Json};
use common::models::{Account, AuthSession, UserProgress};
use common::progression::rank_title;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{BearerToken, CurrentPlayer};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub account: Account,
    pub rank: &'static str,
    /// Leaderboard position
    pub position: Option<i32>,
    pub progress: UserProgress,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthSession>)> {
    let session = state
        .identity
        .signup(&req.email, &req.password, &req.username)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthSession>> {
    let session = state.identity.login(&req.email, &req.password).await?;
    Ok(Json(session))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> ApiResult<StatusCode> {
    state.identity.logout(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentPlayer(session): CurrentPlayer,
) -> ApiResult<Json<MeResponse>> {
    let progress = state.store.load(session.account.id).await?;
    let position = state.store.position(session.account.id).await?;
    Ok(Json(MeResponse {
        rank: rank_title(progress.level),
        position,
        account: session.account,
        progress,
    }))
}
