//! Score, experience and attempt bookkeeping

use chrono::Utc;

use crate::models::UserProgress;
use crate::unlock;

/// Points awarded per completed level
pub const POINTS_PER_LEVEL: i64 = 100;

/// 100 per completed level minus one per full minute played. May go negative.
pub fn score(levels_completed: usize, total_seconds: i64) -> i64 {
    POINTS_PER_LEVEL * levels_completed as i64 - total_seconds.div_euclid(60)
}

/// Correct answers needed to pass: ceil(percent% of `total`)
pub fn pass_mark(total: usize, percent: u32) -> usize {
    (total * percent as usize).div_ceil(100)
}

/// Rank title shown next to a player's name
pub fn rank_title(experience_level: i32) -> &'static str {
    match experience_level {
        i32::MIN..=1 => "Recruit",
        2 => "Cyber Cadet",
        3 => "Signals Officer",
        4 => "Cyber Commander",
        _ => "Cyber General",
    }
}

/// Outcome of merging one attempt into a progress record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptMerge {
    /// The level was completed for the first time
    pub newly_completed: bool,
    pub previous_level: i32,
}

impl UserProgress {
    /// Merge one finished attempt.
    ///
    /// Always counts the attempt and keeps the best time for the level.
    /// Passing a level not completed before adds it and raises the experience
    /// level. The score is recomputed every time.
    pub fn record_attempt(&mut self, level_id: &str, elapsed_seconds: i64, passed: bool) -> AttemptMerge {
        let elapsed_seconds = elapsed_seconds.max(0);
        let previous_level = self.level;

        self.attempts.increment(level_id);
        self.time_taken.keep_best(level_id, elapsed_seconds);

        let newly_completed = passed && !self.has_completed(level_id);
        if newly_completed {
            self.completed_levels.push(level_id.to_string());
            self.level = unlock::experience_after_completion(self.level, level_id);
        }

        self.score = score(self.completed_levels.len(), self.time_taken.total);
        self.last_login = Utc::now();

        AttemptMerge {
            newly_completed,
            previous_level,
        }
    }
}
