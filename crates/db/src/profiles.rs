//! Progress record queries

use common::models::{Tally, UserProgress};
use common::progression::AttemptMerge;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

const TOTAL_KEY: &str = "total";

/// Encode a tally as a flat object with a `total` key
pub fn tally_to_json(tally: &Tally) -> Value {
    let mut map = Map::new();
    for (level_id, value) in &tally.per_level {
        map.insert(level_id.clone(), Value::from(*value));
    }
    map.insert(TOTAL_KEY.to_string(), Value::from(tally.total));
    Value::Object(map)
}

/// Decode a flat `{level: n, total: n}` object. Non-numeric entries are
/// skipped and a missing total is rebuilt from the entries.
pub fn tally_from_json(value: &Value) -> Tally {
    let mut tally = Tally::default();
    let Some(map) = value.as_object() else {
        return tally;
    };

    let mut total = None;
    for (key, entry) in map {
        let Some(n) = entry.as_i64().or_else(|| entry.as_f64().map(|f| f as i64)) else {
            continue;
        };
        if key == TOTAL_KEY {
            total = Some(n);
        } else {
            tally.per_level.insert(key.clone(), n);
        }
    }
    tally.total = total.unwrap_or_else(|| tally.sum());
    tally
}

fn progress_from_row(row: &PgRow) -> UserProgress {
    let attempts: Value = row.get("attempts");
    let time_taken: Value = row.get("time_taken");
    UserProgress {
        user_id: row.get("id"),
        completed_levels: row.get("completed_levels"),
        attempts: tally_from_json(&attempts),
        time_taken: tally_from_json(&time_taken),
        level: row.get("level"),
        score: row.get("score"),
        last_login: row.get("last_login"),
    }
}

/// Create the record if missing and return it
pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<UserProgress, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO profiles (id, last_login)
        VALUES ($1, NOW())
        ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id
        RETURNING id, completed_levels, attempts, time_taken, level, score, last_login
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(progress_from_row(&row))
}

/// Stamp the last login time
pub async fn touch_login(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE profiles SET last_login = NOW(), updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Merge one finished attempt into the player's record.
///
/// The row is locked for the whole read-merge-write so two attempts for the
/// same player cannot lose each other's update.
pub async fn record_attempt(
    pool: &PgPool,
    user_id: Uuid,
    level_id: &str,
    elapsed_seconds: i64,
    passed: bool,
) -> Result<(UserProgress, AttemptMerge), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO profiles (id, last_login)
        VALUES ($1, NOW())
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let row = sqlx::query(
        r#"
        SELECT id, completed_levels, attempts, time_taken, level, score, last_login
        FROM profiles
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let mut progress = progress_from_row(&row);
    let merge = progress.record_attempt(level_id, elapsed_seconds, passed);

    sqlx::query(
        r#"
        UPDATE profiles
        SET completed_levels = $2,
            attempts = $3,
            time_taken = $4,
            level = $5,
            score = $6,
            last_login = $7,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(&progress.completed_levels)
    .bind(tally_to_json(&progress.attempts))
    .bind(tally_to_json(&progress.time_taken))
    .bind(progress.level)
    .bind(progress.score)
    .bind(progress.last_login)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!(
        user_id = %user_id,
        level_id,
        elapsed_seconds,
        passed,
        score = progress.score,
        "Recorded attempt"
    );

    Ok((progress, merge))
}
