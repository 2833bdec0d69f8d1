//! Mission catalog routes

use axum::{
    extract::{Path, State},
    Json,
};
use common::catalog;
use common::models::{Level, LevelOverview, Scenario};
use common::unlock::is_unlocked;
use serde::Serialize;
use std::sync::Arc;

use crate::auth::CurrentPlayer;
use crate::error::{ApiResult, OptionExt};
use crate::state::AppState;

#[derive(Serialize)]
pub struct LevelDetail {
    pub level: &'static Level,
    pub scenario: &'static Scenario,
}

/// Every level with the player's standing on it
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentPlayer(session): CurrentPlayer,
) -> ApiResult<Json<Vec<LevelOverview>>> {
    let progress = state.store.load(session.account.id).await?;

    let overview = catalog::levels()
        .iter()
        .map(|level| LevelOverview {
            level,
            unlocked: is_unlocked(level.id, &progress.completed_levels),
            completed: progress.has_completed(level.id),
            attempts: progress.attempts.get(level.id).unwrap_or(0),
            best_time: progress.time_taken.get(level.id),
        })
        .collect();

    Ok(Json(overview))
}

pub async fn get(Path(level_id): Path<String>) -> ApiResult<Json<LevelDetail>> {
    let level = catalog::level(&level_id).not_found(format!("Mission '{}' not found", level_id))?;
    let scenario = catalog::scenario_for(&level_id)
        .not_found(format!("Scenario for '{}' not found", level_id))?;

    Ok(Json(LevelDetail { level, scenario }))
}
