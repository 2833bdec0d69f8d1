//! Leaderboard queries

use common::models::LeaderboardEntry;
use common::progression::rank_title;
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::profiles::tally_from_json;

/// Get the global leaderboard.
///
/// Ordered by levels completed, then least total time, then fewest attempts.
pub async fn get_leaderboard(
    pool: &PgPool,
    limit: i32,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT
            a.id, a.username, a.avatar,
            p.completed_levels, p.attempts, p.time_taken,
            p.level, p.score, p.last_login,
            COALESCE(array_length(p.completed_levels, 1), 0)::int as levels_completed
        FROM profiles p
        JOIN accounts a ON a.id = p.id
        ORDER BY
            COALESCE(array_length(p.completed_levels, 1), 0) DESC,
            COALESCE((p.time_taken->>'total')::bigint, 0) ASC,
            COALESCE((p.attempts->>'total')::bigint, 0) ASC,
            a.username ASC
        LIMIT $1
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    let entries = rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let attempts: Value = row.get("attempts");
            let time_taken: Value = row.get("time_taken");
            let level: i32 = row.get("level");
            LeaderboardEntry {
                position: (idx + 1) as i32,
                id: row.get("id"),
                username: row.get("username"),
                rank: rank_title(level).to_string(),
                avatar: row.get("avatar"),
                completed_levels: row.get("completed_levels"),
                levels_completed: row.get("levels_completed"),
                attempts: tally_from_json(&attempts),
                time_taken: tally_from_json(&time_taken),
                score: row.get("score"),
                last_login: row.get("last_login"),
            }
        })
        .collect();

    Ok(entries)
}

/// Get a player's position on the leaderboard
pub async fn get_user_position(pool: &PgPool, user_id: Uuid) -> Result<Option<i32>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        WITH ranked AS (
            SELECT
                p.id,
                ROW_NUMBER() OVER (
                    ORDER BY
                        COALESCE(array_length(p.completed_levels, 1), 0) DESC,
                        COALESCE((p.time_taken->>'total')::bigint, 0) ASC,
                        COALESCE((p.attempts->>'total')::bigint, 0) ASC,
                        a.username ASC
                ) as position
            FROM profiles p
            JOIN accounts a ON a.id = p.id
        )
        SELECT position::int as position FROM ranked WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.get("position")))
}
