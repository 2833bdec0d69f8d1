//! Mission play-through state machine
//!
//! A mission walks `NotStarted -> InProgress(i) -> Completed | Failed`.
//! Every question runs under its own countdown. Wrong answers and timeouts
//! are recorded and play continues; after the last question the run is
//! graded against the pass threshold. Terminal states are final, a replay
//! needs a new runner.

use chrono::{DateTime, Utc};
use common::models::{Account, Level, Question, Scenario, UserProgress};
use common::progression::pass_mark;
use common::{catalog, unlock, Error, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::ProgressStore;
use crate::timer::{QuestionTimer, Tick};

/// Where a mission stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MissionState {
    NotStarted,
    InProgress { question_index: usize },
    Completed,
    Failed,
}

impl MissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionState::Completed | MissionState::Failed)
    }
}

/// The player a mission runs for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub user_id: Uuid,
    pub username: String,
}

impl From<&Account> for Player {
    fn from(account: &Account) -> Self {
        Self {
            user_id: account.id,
            username: account.username.clone(),
        }
    }
}

/// One answered (or timed out) question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub question_id: &'static str,
    /// `None` when the countdown ran out
    pub selected_option_id: Option<String>,
    pub correct: bool,
    pub elapsed_seconds: u32,
}

/// What the player learns after answering
#[derive(Debug, Clone, Serialize)]
pub struct AnswerFeedback {
    pub question_id: &'static str,
    pub correct: bool,
    pub timed_out: bool,
    pub correct_option_id: &'static str,
    pub consequence: Option<&'static str>,
    pub explanation: &'static str,
}

/// Result of `advance`
#[derive(Debug, Clone)]
pub enum Step {
    Next { question_index: usize },
    Finished(MissionReport),
}

/// Final outcome of a mission, after it has been persisted
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub level_id: &'static str,
    pub passed: bool,
    pub correct: usize,
    pub total: usize,
    pub required: usize,
    pub elapsed_seconds: i64,
    pub newly_completed: bool,
    pub progress: UserProgress,
}

/// Serializable view of a running mission
#[derive(Debug, Clone, Serialize)]
pub struct MissionSnapshot {
    pub level_id: &'static str,
    #[serde(flatten)]
    pub state: MissionState,
    pub question: Option<&'static Question>,
    pub answered: bool,
    pub remaining_seconds: u32,
    pub question_time_limit: u32,
    pub correct: usize,
    pub total_questions: usize,
    pub elapsed_seconds: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub answers: Vec<Answer>,
}

/// Drives one play-through of a level's scenario
pub struct MissionRunner {
    player: Player,
    level: &'static Level,
    scenario: &'static Scenario,
    store: Arc<dyn ProgressStore>,
    pass_threshold_percent: u32,
    state: MissionState,
    timer: QuestionTimer,
    answers: Vec<Answer>,
    correct: usize,
    elapsed_seconds: i64,
    started_at: Option<DateTime<Utc>>,
}

impl MissionRunner {
    /// Prepare a mission for the signed-in player.
    ///
    /// Fails with `AuthRequired` without a player and `NotFound` when the
    /// level has no catalog entry or scenario.
    pub fn new(
        player: Option<Player>,
        level_id: &str,
        store: Arc<dyn ProgressStore>,
        pass_threshold_percent: u32,
    ) -> Result<Self> {
        let player = player.ok_or(Error::AuthRequired)?;
        let level = catalog::level(level_id)
            .ok_or_else(|| Error::NotFound(format!("Mission '{}' not found", level_id)))?;
        let scenario = catalog::scenario_for(level_id)
            .ok_or_else(|| Error::NotFound(format!("Scenario for '{}' not found", level_id)))?;

        Ok(Self {
            player,
            level,
            scenario,
            store,
            pass_threshold_percent,
            state: MissionState::NotStarted,
            timer: QuestionTimer::new(),
            answers: Vec::with_capacity(scenario.questions.len()),
            correct: 0,
            elapsed_seconds: 0,
            started_at: None,
        })
    }

    /// Enter the mission if the level is unlocked and start the first countdown
    pub async fn begin(&mut self) -> Result<()> {
        if self.state != MissionState::NotStarted {
            return Err(Error::InvalidState("mission already started".to_string()));
        }

        let progress = self.store.load(self.player.user_id).await?;
        if !unlock::is_unlocked(self.level.id, &progress.completed_levels) {
            warn!(
                "{} tried to enter locked mission {}",
                self.player.username, self.level.id
            );
            return Err(Error::LockedLevel(self.level.id.to_string()));
        }

        self.state = MissionState::InProgress { question_index: 0 };
        self.started_at = Some(Utc::now());
        self.timer.start(self.scenario.question_time_limit());

        info!(
            "🎯 {} started mission {} ({} questions)",
            self.player.username,
            self.level.id,
            self.scenario.questions.len()
        );
        Ok(())
    }

    /// Answer the current question
    pub fn select_option(&mut self, option_id: &str) -> Result<AnswerFeedback> {
        let question = self.open_question()?;
        let option = question.option(option_id).ok_or_else(|| {
            Error::InvalidState(format!(
                "option '{}' is not part of question '{}'",
                option_id, question.id
            ))
        })?;

        let remaining = self.timer.stop();
        let elapsed = self.scenario.question_time_limit().saturating_sub(remaining);
        let correct = option.id == question.correct_option_id;

        debug!(
            question_id = question.id,
            option_id, correct, elapsed, "Answer recorded"
        );

        self.record(question, Some(option.id.to_string()), correct, elapsed);
        Ok(AnswerFeedback {
            question_id: question.id,
            correct,
            timed_out: false,
            correct_option_id: question.correct_option_id,
            consequence: option.consequence,
            explanation: question.explanation,
        })
    }

    /// Treat the current question as unanswered and wrong
    pub fn timer_expire(&mut self) -> Result<AnswerFeedback> {
        let question = self.open_question()?;
        self.timer.stop();
        let elapsed = self.scenario.question_time_limit();

        debug!(question_id = question.id, "Question timed out");

        self.record(question, None, false, elapsed);
        Ok(AnswerFeedback {
            question_id: question.id,
            correct: false,
            timed_out: true,
            correct_option_id: question.correct_option_id,
            consequence: None,
            explanation: question.explanation,
        })
    }

    /// One second of countdown. Returns feedback when the question timed out.
    pub fn tick(&mut self) -> Option<AnswerFeedback> {
        if self.open_question().is_err() {
            return None;
        }
        match self.timer.tick() {
            Tick::Expired => self.timer_expire().ok(),
            Tick::Running(_) | Tick::Idle => None,
        }
    }

    /// Move past an answered question; after the last one, grade and persist.
    ///
    /// A failed save is returned as `PersistenceFailure` but the mission
    /// still ends in its terminal state.
    pub async fn advance(&mut self) -> Result<Step> {
        let index = match self.state {
            MissionState::InProgress { question_index } => question_index,
            other => {
                return Err(Error::InvalidState(format!(
                    "cannot advance from {:?}",
                    other
                )))
            }
        };
        if self.answers.len() <= index {
            return Err(Error::InvalidState(
                "current question has not been answered".to_string(),
            ));
        }

        let total = self.scenario.questions.len();
        if index + 1 < total {
            self.state = MissionState::InProgress {
                question_index: index + 1,
            };
            self.timer.start(self.scenario.question_time_limit());
            return Ok(Step::Next {
                question_index: index + 1,
            });
        }

        let required = pass_mark(total, self.pass_threshold_percent);
        let passed = self.correct >= required;
        self.state = if passed {
            MissionState::Completed
        } else {
            MissionState::Failed
        };

        info!(
            "{} {} mission {} with {}/{} correct in {}s",
            self.player.username,
            if passed { "completed" } else { "failed" },
            self.level.id,
            self.correct,
            total,
            self.elapsed_seconds
        );

        let record = self
            .store
            .record_attempt(
                self.player.user_id,
                self.level.id,
                self.elapsed_seconds,
                passed,
            )
            .await?;

        if record.merge.newly_completed {
            info!(
                "🏆 {} unlocked the next mission (level {} -> {})",
                self.player.username, record.merge.previous_level, record.progress.level
            );
        }

        Ok(Step::Finished(MissionReport {
            level_id: self.level.id,
            passed,
            correct: self.correct,
            total,
            required,
            elapsed_seconds: self.elapsed_seconds,
            newly_completed: record.merge.newly_completed,
            progress: record.progress,
        }))
    }

    pub fn state(&self) -> MissionState {
        self.state
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn level(&self) -> &'static Level {
        self.level
    }

    pub fn remaining(&self) -> u32 {
        self.timer.remaining()
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn elapsed_seconds(&self) -> i64 {
        self.elapsed_seconds
    }

    pub fn current_question(&self) -> Option<&'static Question> {
        match self.state {
            MissionState::InProgress { question_index } => {
                self.scenario.questions.get(question_index)
            }
            _ => None,
        }
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        let answered = match self.state {
            MissionState::InProgress { question_index } => self.answers.len() > question_index,
            _ => false,
        };
        MissionSnapshot {
            level_id: self.level.id,
            state: self.state,
            question: self.current_question(),
            answered,
            remaining_seconds: self.timer.remaining(),
            question_time_limit: self.scenario.question_time_limit(),
            correct: self.correct,
            total_questions: self.scenario.questions.len(),
            elapsed_seconds: self.elapsed_seconds,
            started_at: self.started_at,
            answers: self.answers.clone(),
        }
    }

    /// The current question, if it is still waiting for an answer
    fn open_question(&self) -> Result<&'static Question> {
        let index = match self.state {
            MissionState::InProgress { question_index } => question_index,
            other => {
                return Err(Error::InvalidState(format!(
                    "no question open in {:?}",
                    other
                )))
            }
        };
        if self.answers.len() > index {
            return Err(Error::InvalidState(
                "question already answered".to_string(),
            ));
        }
        self.scenario
            .questions
            .get(index)
            .ok_or_else(|| Error::Internal(format!("question index {} out of range", index)))
    }

    fn record(
        &mut self,
        question: &'static Question,
        selected_option_id: Option<String>,
        correct: bool,
        elapsed: u32,
    ) {
        if correct {
            self.correct += 1;
        }
        self.elapsed_seconds += i64::from(elapsed);
        self.answers.push(Answer {
            question_id: question.id,
            selected_option_id,
            correct,
            elapsed_seconds: elapsed,
        });
    }
}
