//! Leaderboard ordering

use common::models::LeaderboardEntry;
use std::cmp::Ordering;

/// Leaderboard order: more levels completed first, then less total time,
/// then fewer attempts, then username.
pub fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.levels_completed
        .cmp(&a.levels_completed)
        .then(a.time_taken.total.cmp(&b.time_taken.total))
        .then(a.attempts.total.cmp(&b.attempts.total))
        .then_with(|| a.username.cmp(&b.username))
}

/// Sort entries, assign 1-based positions and truncate to `limit`
pub fn rank_entries(mut entries: Vec<LeaderboardEntry>, limit: usize) -> Vec<LeaderboardEntry> {
    entries.sort_by(compare);
    entries.truncate(limit);
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.position = (idx + 1) as i32;
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::models::Tally;
    use uuid::Uuid;

    fn entry(username: &str, completed: i32, time_total: i64, attempts_total: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            position: 0,
            id: Uuid::new_v4(),
            username: username.to_string(),
            rank: "Recruit".to_string(),
            avatar: None,
            completed_levels: Vec::new(),
            levels_completed: completed,
            attempts: Tally {
                total: attempts_total,
                ..Default::default()
            },
            time_taken: Tally {
                total: time_total,
                ..Default::default()
            },
            score: 0,
            last_login: Utc::now(),
        }
    }

    fn names(entries: &[LeaderboardEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.username.as_str()).collect()
    }

    #[test]
    fn test_more_levels_wins() {
        let ranked = rank_entries(vec![entry("slow", 1, 10, 1), entry("fast", 2, 500, 9)], 10);
        assert_eq!(names(&ranked), vec!["fast", "slow"]);
        assert_eq!(ranked[0].position, 1);
        assert_eq!(ranked[1].position, 2);
    }

    #[test]
    fn test_time_breaks_level_ties() {
        let ranked = rank_entries(vec![entry("a", 2, 300, 2), entry("b", 2, 120, 5)], 10);
        assert_eq!(names(&ranked), vec!["b", "a"]);
    }

    #[test]
    fn test_attempts_break_time_ties() {
        let ranked = rank_entries(vec![entry("a", 1, 60, 4), entry("b", 1, 60, 2)], 10);
        assert_eq!(names(&ranked), vec!["b", "a"]);
    }

    #[test]
    fn test_limit_truncates() {
        let ranked = rank_entries(
            vec![entry("a", 3, 0, 0), entry("b", 2, 0, 0), entry("c", 1, 0, 0)],
            2,
        );
        assert_eq!(names(&ranked), vec!["a", "b"]);
    }
}
