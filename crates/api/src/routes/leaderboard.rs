//! Leaderboard routes

use axum::{
    extract::{Query, State},
    Json,
};
use common::models::LeaderboardEntry;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    25
}

pub async fn global(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    let limit = query.limit.clamp(1, 100);
    let leaderboard = state.store.leaderboard(limit).await?;
    Ok(Json(leaderboard))
}
