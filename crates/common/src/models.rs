//! Domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A registered player
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An authenticated login session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub account: Account,
    pub expires_at: DateTime<Utc>,
}

/// Mission difficulty, ordered from easiest to hardest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

/// A mission in the static catalog
#[derive(Debug, Clone, Serialize)]
pub struct Level {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub difficulty: Difficulty,
    /// Display hint only; gating follows the completion chain
    pub unlock_rank: i32,
    pub image: &'static str,
}

/// The question set played for one level
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub id: &'static str,
    pub level_id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub time_limit_seconds: u32,
    pub questions: &'static [Question],
}

impl Scenario {
    /// Countdown for a single question: the mission budget split evenly
    pub fn question_time_limit(&self) -> u32 {
        if self.questions.is_empty() {
            return self.time_limit_seconds.max(1);
        }
        (self.time_limit_seconds / self.questions.len() as u32).max(1)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub text: &'static str,
    pub options: &'static [QuestionOption],
    pub correct_option_id: &'static str,
    pub explanation: &'static str,
}

impl Question {
    pub fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionOption {
    pub id: &'static str,
    pub text: &'static str,
    /// Flavor text revealed once the option is picked
    pub consequence: Option<&'static str>,
}

/// Per-level counters with a running total.
///
/// Stored externally as a flat JSON object with a `total` key; in memory the
/// total is a field so it can never collide with a level id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tally {
    pub per_level: BTreeMap<String, i64>,
    pub total: i64,
}

impl Tally {
    pub fn get(&self, level_id: &str) -> Option<i64> {
        self.per_level.get(level_id).copied()
    }

    /// Count one more for the level; `total` stays the sum of all entries
    pub fn increment(&mut self, level_id: &str) {
        *self.per_level.entry(level_id.to_string()).or_insert(0) += 1;
        self.total += 1;
    }

    /// Keep the smaller of the stored and the new value, and add the new
    /// value to `total`
    pub fn keep_best(&mut self, level_id: &str, value: i64) {
        self.per_level
            .entry(level_id.to_string())
            .and_modify(|best| *best = (*best).min(value))
            .or_insert(value);
        self.total += value;
    }

    pub fn sum(&self) -> i64 {
        self.per_level.values().sum()
    }
}

/// A player's persisted progress record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProgress {
    pub user_id: Uuid,
    pub completed_levels: Vec<String>,
    pub attempts: Tally,
    /// Best completion time per level, total of all time played
    pub time_taken: Tally,
    /// Experience level, never decreases
    pub level: i32,
    pub score: i64,
    pub last_login: DateTime<Utc>,
}

impl UserProgress {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            completed_levels: Vec::new(),
            attempts: Tally::default(),
            time_taken: Tally::default(),
            level: 1,
            score: 0,
            last_login: Utc::now(),
        }
    }

    pub fn has_completed(&self, level_id: &str) -> bool {
        self.completed_levels.iter().any(|id| id == level_id)
    }
}

/// Per-level view of a player's progress
#[derive(Debug, Clone, Serialize)]
pub struct LevelOverview {
    pub level: &'static Level,
    pub unlocked: bool,
    pub completed: bool,
    pub attempts: i64,
    pub best_time: Option<i64>,
}

/// Leaderboard entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based place in the ordering
    pub position: i32,
    pub id: Uuid,
    pub username: String,
    /// Rank title derived from the experience level
    pub rank: String,
    pub avatar: Option<String>,
    pub completed_levels: Vec<String>,
    pub levels_completed: i32,
    pub attempts: Tally,
    pub time_taken: Tally,
    pub score: i64,
    pub last_login: DateTime<Utc>,
}
