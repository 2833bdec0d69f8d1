//! Progress routes

use axum::{extract::State, Json};
use common::models::UserProgress;
use std::sync::Arc;

use crate::auth::CurrentPlayer;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentPlayer(session): CurrentPlayer,
) -> ApiResult<Json<UserProgress>> {
    let progress = state.store.load(session.account.id).await?;
    Ok(Json(progress))
}
