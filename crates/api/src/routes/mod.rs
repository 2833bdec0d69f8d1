//! API routes

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;

pub mod auth;
pub mod health;
pub mod leaderboard;
pub mod levels;
pub mod missions;
pub mod progress;

/// Build the API router with state
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/levels", get(levels::list))
        .route("/api/levels/:id", get(levels::get))
        .route("/api/progress", get(progress::get))
        .route("/api/missions", post(missions::begin))
        .route(
            "/api/missions/:id",
            get(missions::get).delete(missions::abandon),
        )
        .route("/api/missions/:id/answer", post(missions::answer))
        .route("/api/missions/:id/advance", post(missions::advance))
        .route("/api/leaderboard", get(leaderboard::global))
        .with_state(state)
}
