//! Mission play routes
//!
//! Missions live in memory for as long as they are played, one per player.
//! Only the final outcome of a finished mission is saved, and the mission is
//! dropped once it ends.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use game::mission::{AnswerFeedback, MissionReport, MissionSnapshot, Player, Step};
use game::MissionRunner;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{CurrentPlayer, MaybePlayer};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BeginRequest {
    pub level_id: String,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub option_id: String,
}

#[derive(Serialize)]
pub struct BeginResponse {
    pub mission_id: Uuid,
    pub mission: MissionSnapshot,
}

#[derive(Serialize)]
pub struct AnswerResponse {
    pub feedback: AnswerFeedback,
    pub mission: MissionSnapshot,
}

#[derive(Serialize)]
pub struct AdvanceResponse {
    pub mission: MissionSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<MissionReport>,
    /// Set when the outcome could not be saved; the mission still ended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

/// Enter a mission
pub async fn begin(
    State(state): State<Arc<AppState>>,
    MaybePlayer(session): MaybePlayer,
    Json(req): Json<BeginRequest>,
) -> ApiResult<(StatusCode, Json<BeginResponse>)> {
    let player = session.as_ref().map(|s| Player::from(&s.account));
    let mut runner = MissionRunner::new(
        player,
        &req.level_id,
        state.store.clone(),
        state.config.pass_threshold_percent,
    )?;
    runner.begin().await?;

    let mission = runner.snapshot();
    let username = runner.player().username.clone();
    let (mission_id, replaced) = state.missions.insert(runner);
    if replaced > 0 {
        debug!(
            "{} started mission {}, replacing {} unfinished mission(s)",
            username, mission_id, replaced
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(BeginResponse {
            mission_id,
            mission,
        }),
    ))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentPlayer(session): CurrentPlayer,
    Path(mission_id): Path<Uuid>,
) -> ApiResult<Json<MissionSnapshot>> {
    let handle = state.missions.get(mission_id, session.account.id)?;
    let live = handle.lock().await;
    Ok(Json(live.runner.snapshot()))
}

pub async fn answer(
    State(state): State<Arc<AppState>>,
    CurrentPlayer(session): CurrentPlayer,
    Path(mission_id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> ApiResult<Json<AnswerResponse>> {
    let handle = state.missions.get(mission_id, session.account.id)?;
    let mut live = handle.lock().await;
    live.touch();

    let feedback = live.runner.select_option(&req.option_id)?;
    Ok(Json(AnswerResponse {
        feedback,
        mission: live.runner.snapshot(),
    }))
}

pub async fn advance(
    State(state): State<Arc<AppState>>,
    CurrentPlayer(session): CurrentPlayer,
    Path(mission_id): Path<Uuid>,
) -> ApiResult<Json<AdvanceResponse>> {
    let handle = state.missions.get(mission_id, session.account.id)?;
    let mut live = handle.lock().await;
    live.touch();

    let (report, save_error) = match live.runner.advance().await {
        Ok(Step::Next { .. }) => (None, None),
        Ok(Step::Finished(report)) => (Some(report), None),
        Err(common::Error::PersistenceFailure(msg)) => {
            warn!(
                "Mission {} finished but was not saved: {}",
                mission_id, msg
            );
            (None, Some("Failed to save progress".to_string()))
        }
        Err(e) => return Err(ApiError::from(e)),
    };

    let mission = live.runner.snapshot();
    if mission.state.is_terminal() {
        state.missions.finish(mission_id);
    }

    Ok(Json(AdvanceResponse {
        mission,
        report,
        save_error,
    }))
}

/// Walk away from a mission without saving anything
pub async fn abandon(
    State(state): State<Arc<AppState>>,
    CurrentPlayer(session): CurrentPlayer,
    Path(mission_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.missions.remove(mission_id, session.account.id)?;
    Ok(StatusCode::NO_CONTENT)
}
