#[cfg(test)]
mod tests {
    use crate::mission::*;
    use crate::store::{AttemptRecord, MemoryProgressStore, ProgressStore};
    use async_trait::async_trait;
    use common::models::{LeaderboardEntry, UserProgress};
    use common::{catalog, Error, Result};
    use std::sync::Arc;
    use uuid::Uuid;

    /// Reads work, every write fails
    struct BrokenWrites(MemoryProgressStore);

    #[async_trait]
    impl ProgressStore for BrokenWrites {
        async fn load(&self, user_id: Uuid) -> Result<UserProgress> {
            self.0.load(user_id).await
        }

        async fn record_attempt(
            &self,
            _user_id: Uuid,
            _level_id: &str,
            _elapsed_seconds: i64,
            _passed: bool,
        ) -> Result<AttemptRecord> {
            Err(Error::PersistenceFailure("connection reset".to_string()))
        }

        async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
            self.0.leaderboard(limit).await
        }

        async fn position(&self, user_id: Uuid) -> Result<Option<i32>> {
            self.0.position(user_id).await
        }
    }

    fn player() -> Player {
        Player {
            user_id: Uuid::new_v4(),
            username: "operative".to_string(),
        }
    }

    fn correct_answer(runner: &MissionRunner) -> &'static str {
        runner.current_question().unwrap().correct_option_id
    }

    fn wrong_answer(runner: &MissionRunner) -> &'static str {
        let question = runner.current_question().unwrap();
        question
            .options
            .iter()
            .find(|o| o.id != question.correct_option_id)
            .unwrap()
            .id
    }

    /// Answer every question, correct where `pattern` says so
    async fn play(runner: &mut MissionRunner, pattern: &[bool]) -> Result<Step> {
        let mut last = None;
        for (idx, correct) in pattern.iter().enumerate() {
            assert_eq!(
                runner.state(),
                MissionState::InProgress { question_index: idx }
            );
            let option = if *correct {
                correct_answer(runner)
            } else {
                wrong_answer(runner)
            };
            runner.select_option(option)?;
            last = Some(runner.advance().await?);
        }
        Ok(last.unwrap())
    }

    async fn unlocked_level_one(store: &MemoryProgressStore, player: &Player) {
        store
            .record_attempt(player.user_id, "level-0", 60, true)
            .await
            .unwrap();
    }

    #[test]
    fn test_requires_signed_in_player() {
        let store = Arc::new(MemoryProgressStore::new());
        let err = MissionRunner::new(None, "level-0", store, 60).err();
        assert_eq!(err, Some(Error::AuthRequired));
    }

    #[test]
    fn test_unknown_mission_is_not_found() {
        let store = Arc::new(MemoryProgressStore::new());
        let err = MissionRunner::new(Some(player()), "level-42", store, 60).err();
        assert!(matches!(err, Some(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_locked_level_blocks_entry() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut runner = MissionRunner::new(Some(player()), "level-1", store, 60).unwrap();

        let err = runner.begin().await.unwrap_err();
        assert_eq!(err, Error::LockedLevel("level-1".to_string()));
        assert_eq!(runner.state(), MissionState::NotStarted);
        assert_eq!(runner.remaining(), 0);
    }

    #[tokio::test]
    async fn test_begin_starts_first_countdown() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut runner = MissionRunner::new(Some(player()), "level-0", store, 60).unwrap();

        runner.begin().await.unwrap();
        assert_eq!(
            runner.state(),
            MissionState::InProgress { question_index: 0 }
        );
        assert_eq!(runner.remaining(), 150);
        assert_eq!(runner.current_question().unwrap().id, "q1-l0");
    }

    #[tokio::test]
    async fn test_begin_twice_is_rejected() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut runner = MissionRunner::new(Some(player()), "level-0", store, 60).unwrap();
        runner.begin().await.unwrap();
        assert!(matches!(
            runner.begin().await,
            Err(Error::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_two_of_three_passes() {
        let store = Arc::new(MemoryProgressStore::new());
        let player = player();
        unlocked_level_one(&store, &player).await;

        let mut runner =
            MissionRunner::new(Some(player.clone()), "level-1", store.clone(), 60).unwrap();
        runner.begin().await.unwrap();

        let Step::Finished(report) = play(&mut runner, &[true, false, true]).await.unwrap() else {
            panic!("expected the mission to finish");
        };

        assert!(report.passed);
        assert_eq!(report.correct, 2);
        assert_eq!(report.required, 2);
        assert!(report.newly_completed);
        assert_eq!(runner.state(), MissionState::Completed);

        let progress = store.load(player.user_id).await.unwrap();
        assert!(progress.has_completed("level-1"));
        assert_eq!(progress.attempts.get("level-1"), Some(1));
        assert_eq!(progress.level, 3);
    }

    #[tokio::test]
    async fn test_one_of_three_fails_and_still_counts_attempt() {
        let store = Arc::new(MemoryProgressStore::new());
        let player = player();
        unlocked_level_one(&store, &player).await;

        let mut runner =
            MissionRunner::new(Some(player.clone()), "level-1", store.clone(), 60).unwrap();
        runner.begin().await.unwrap();

        let Step::Finished(report) = play(&mut runner, &[false, true, false]).await.unwrap() else {
            panic!("expected the mission to finish");
        };

        assert!(!report.passed);
        assert_eq!(runner.state(), MissionState::Failed);

        let progress = store.load(player.user_id).await.unwrap();
        assert!(!progress.has_completed("level-1"));
        assert_eq!(progress.attempts.get("level-1"), Some(1));
        assert_eq!(progress.attempts.total, 2);
    }

    #[tokio::test]
    async fn test_wrong_answer_does_not_end_mission() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut runner = MissionRunner::new(Some(player()), "level-0", store, 60).unwrap();
        runner.begin().await.unwrap();

        let option = wrong_answer(&runner);
        let feedback = runner.select_option(option).unwrap();
        assert!(!feedback.correct);
        assert!(feedback.consequence.is_some());
        assert_eq!(
            runner.state(),
            MissionState::InProgress { question_index: 0 }
        );

        let step = runner.advance().await.unwrap();
        assert!(matches!(step, Step::Next { question_index: 1 }));
    }

    #[tokio::test]
    async fn test_elapsed_time_comes_from_timer() {
        let store = Arc::new(MemoryProgressStore::new());
        let player = player();
        let mut runner =
            MissionRunner::new(Some(player.clone()), "level-0", store.clone(), 60).unwrap();
        runner.begin().await.unwrap();

        for _ in 0..7 {
            assert!(runner.tick().is_none());
        }
        runner.select_option(correct_answer(&runner)).unwrap();
        // ticks between answer and advance are not counted
        for _ in 0..3 {
            runner.tick();
        }
        runner.advance().await.unwrap();

        for _ in 0..5 {
            runner.tick();
        }
        runner.select_option(correct_answer(&runner)).unwrap();
        let Step::Finished(report) = runner.advance().await.unwrap() else {
            panic!("expected the mission to finish");
        };

        assert_eq!(report.elapsed_seconds, 12);
        let progress = store.load(player.user_id).await.unwrap();
        assert_eq!(progress.time_taken.get("level-0"), Some(12));
    }

    #[tokio::test]
    async fn test_timeout_counts_as_wrong_answer() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut runner = MissionRunner::new(Some(player()), "level-0", store, 60).unwrap();
        runner.begin().await.unwrap();

        let limit = catalog::scenario_for("level-0").unwrap().question_time_limit();
        let mut feedback = None;
        for _ in 0..limit {
            if let Some(f) = runner.tick() {
                assert!(feedback.is_none(), "expiry reported twice");
                feedback = Some(f);
            }
        }

        let feedback = feedback.expect("timer should have expired");
        assert!(feedback.timed_out);
        assert!(!feedback.correct);
        assert_eq!(runner.answers()[0].selected_option_id, None);
        assert_eq!(runner.elapsed_seconds(), i64::from(limit));

        // no more expiries, and the question cannot be answered late
        assert!(runner.tick().is_none());
        assert!(matches!(
            runner.select_option(correct_answer(&runner)),
            Err(Error::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_explicit_timer_expire() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut runner = MissionRunner::new(Some(player()), "level-0", store, 60).unwrap();
        runner.begin().await.unwrap();

        let feedback = runner.timer_expire().unwrap();
        assert!(feedback.timed_out);
        assert!(runner.timer_expire().is_err());
    }

    #[tokio::test]
    async fn test_advance_requires_answer() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut runner = MissionRunner::new(Some(player()), "level-0", store, 60).unwrap();
        runner.begin().await.unwrap();

        assert!(matches!(
            runner.advance().await,
            Err(Error::InvalidState(_))
        ));
        assert_eq!(
            runner.state(),
            MissionState::InProgress { question_index: 0 }
        );
    }

    #[tokio::test]
    async fn test_unknown_option_changes_nothing() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut runner = MissionRunner::new(Some(player()), "level-0", store, 60).unwrap();
        runner.begin().await.unwrap();

        assert!(runner.select_option("not-an-option").is_err());
        assert!(runner.answers().is_empty());
        assert_eq!(runner.remaining(), 150);
    }

    #[tokio::test]
    async fn test_terminal_state_is_final() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut runner = MissionRunner::new(Some(player()), "level-0", store, 60).unwrap();
        runner.begin().await.unwrap();
        play(&mut runner, &[true, true]).await.unwrap();

        assert_eq!(runner.state(), MissionState::Completed);
        assert!(runner.advance().await.is_err());
        assert!(runner.begin().await.is_err());
        assert!(runner.tick().is_none());
        assert!(runner.current_question().is_none());
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_terminal_state() {
        let store = Arc::new(BrokenWrites(MemoryProgressStore::new()));
        let mut runner = MissionRunner::new(Some(player()), "level-0", store, 60).unwrap();
        runner.begin().await.unwrap();

        let err = play(&mut runner, &[true, true]).await.unwrap_err();
        assert!(matches!(err, Error::PersistenceFailure(_)));
        assert_eq!(runner.state(), MissionState::Completed);
        assert_eq!(runner.correct(), 2);
    }

    #[tokio::test]
    async fn test_completing_level_unlocks_next() {
        let store = Arc::new(MemoryProgressStore::new());
        let player = player();

        let mut first =
            MissionRunner::new(Some(player.clone()), "level-0", store.clone(), 60).unwrap();
        first.begin().await.unwrap();
        play(&mut first, &[true, true]).await.unwrap();

        let mut second =
            MissionRunner::new(Some(player.clone()), "level-1", store.clone(), 60).unwrap();
        assert!(second.begin().await.is_ok());

        let mut third = MissionRunner::new(Some(player), "level-2", store, 60).unwrap();
        assert!(matches!(
            third.begin().await,
            Err(Error::LockedLevel(_))
        ));
    }

    #[tokio::test]
    async fn test_snapshot_reflects_progress() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut runner = MissionRunner::new(Some(player()), "level-0", store, 60).unwrap();
        runner.begin().await.unwrap();
        runner.tick();

        let snapshot = runner.snapshot();
        assert_eq!(snapshot.remaining_seconds, 149);
        assert!(!snapshot.answered);
        assert_eq!(snapshot.total_questions, 2);
        assert!(snapshot.started_at.is_some());

        runner.select_option(correct_answer(&runner)).unwrap();
        let json = serde_json::to_value(runner.snapshot()).unwrap();
        assert_eq!(json["state"], "in_progress");
        assert_eq!(json["question_index"], 0);
        assert_eq!(json["answered"], true);
        assert_eq!(json["correct"], 1);
    }
}
