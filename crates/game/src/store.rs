//! Progress persistence
//!
//! [`PgProgressStore`] backs the server. [`MemoryProgressStore`] keeps
//! everything in process and is used by tests and local tooling.

use async_trait::async_trait;
use common::models::{Account, LeaderboardEntry, UserProgress};
use common::progression::{rank_title, AttemptMerge};
use common::{Error, Result};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::error;
use uuid::Uuid;

use crate::leaderboard::rank_entries;

/// Result of persisting one attempt
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub progress: UserProgress,
    pub merge: AttemptMerge,
}

/// Per-player progress records
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Read a player's record, creating an empty one if missing
    async fn load(&self, user_id: Uuid) -> Result<UserProgress>;

    /// Merge a finished attempt. Atomic per player.
    async fn record_attempt(
        &self,
        user_id: Uuid,
        level_id: &str,
        elapsed_seconds: i64,
        passed: bool,
    ) -> Result<AttemptRecord>;

    /// All players, best first
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>>;

    /// 1-based leaderboard position; `None` for players without an account
    async fn position(&self, user_id: Uuid) -> Result<Option<i32>>;
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgProgressStore {
    pool: PgPool,
}

impl PgProgressStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressStore for PgProgressStore {
    async fn load(&self, user_id: Uuid) -> Result<UserProgress> {
        db::profiles::get_or_create(&self.pool, user_id)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn record_attempt(
        &self,
        user_id: Uuid,
        level_id: &str,
        elapsed_seconds: i64,
        passed: bool,
    ) -> Result<AttemptRecord> {
        let (progress, merge) =
            db::profiles::record_attempt(&self.pool, user_id, level_id, elapsed_seconds, passed)
                .await
                .map_err(|e| {
                    error!("Failed to record attempt for {}: {}", user_id, e);
                    Error::PersistenceFailure(e.to_string())
                })?;
        Ok(AttemptRecord { progress, merge })
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);
        db::leaderboard::get_leaderboard(&self.pool, limit)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn position(&self, user_id: Uuid) -> Result<Option<i32>> {
        db::leaderboard::get_user_position(&self.pool, user_id)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}

#[derive(Default)]
struct MemoryState {
    records: HashMap<Uuid, UserProgress>,
    accounts: HashMap<Uuid, Account>,
}

/// In-process store; one lock guards every record
#[derive(Default)]
pub struct MemoryProgressStore {
    state: Mutex<MemoryState>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an account visible on the leaderboard
    pub fn register(&self, account: &Account) {
        let mut state = self.lock();
        state.accounts.insert(account.id, account.clone());
        state
            .records
            .entry(account.id)
            .or_insert_with(|| UserProgress::new(account.id));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // merges are applied to a copy and swapped in whole
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn load(&self, user_id: Uuid) -> Result<UserProgress> {
        let mut state = self.lock();
        Ok(state
            .records
            .entry(user_id)
            .or_insert_with(|| UserProgress::new(user_id))
            .clone())
    }

    async fn record_attempt(
        &self,
        user_id: Uuid,
        level_id: &str,
        elapsed_seconds: i64,
        passed: bool,
    ) -> Result<AttemptRecord> {
        let mut state = self.lock();
        let mut progress = state
            .records
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserProgress::new(user_id));

        let merge = progress.record_attempt(level_id, elapsed_seconds, passed);
        state.records.insert(user_id, progress.clone());

        Ok(AttemptRecord { progress, merge })
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let state = self.lock();
        let entries = state
            .accounts
            .values()
            .map(|account| {
                let progress = state
                    .records
                    .get(&account.id)
                    .cloned()
                    .unwrap_or_else(|| UserProgress::new(account.id));
                LeaderboardEntry {
                    position: 0,
                    id: account.id,
                    username: account.username.clone(),
                    rank: rank_title(progress.level).to_string(),
                    avatar: account.avatar.clone(),
                    levels_completed: progress.completed_levels.len() as i32,
                    completed_levels: progress.completed_levels,
                    attempts: progress.attempts,
                    time_taken: progress.time_taken,
                    score: progress.score,
                    last_login: progress.last_login,
                }
            })
            .collect();

        Ok(rank_entries(entries, limit))
    }

    async fn position(&self, user_id: Uuid) -> Result<Option<i32>> {
        let board = self.leaderboard(usize::MAX).await?;
        Ok(board
            .iter()
            .find(|entry| entry.id == user_id)
            .map(|entry| entry.position))
    }
}
