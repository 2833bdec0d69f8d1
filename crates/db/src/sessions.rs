//! Login session queries

use chrono::{DateTime, Utc};
use common::models::{Account, AuthSession};
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Tokens are only stored as their SHA-256, hex encoded
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Store a new session token
pub async fn create(
    pool: &PgPool,
    token: &str,
    account: &Account,
    expires_at: DateTime<Utc>,
) -> Result<AuthSession, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO auth_sessions (token_hash, account_id, created_at, expires_at)
        VALUES ($1, $2, NOW(), $3)
        "#,
    )
    .bind(token_digest(token))
    .bind(account.id)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(AuthSession {
        token: token.to_string(),
        account: account.clone(),
        expires_at,
    })
}

/// Resolve an unexpired token to its session
pub async fn get_active(pool: &PgPool, token: &str) -> Result<Option<AuthSession>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT s.expires_at,
               a.id, a.email, a.username, a.avatar, a.created_at
        FROM auth_sessions s
        JOIN accounts a ON a.id = s.account_id
        WHERE s.token_hash = $1 AND s.expires_at > NOW()
        "#,
    )
    .bind(token_digest(token))
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| AuthSession {
        token: token.to_string(),
        expires_at: r.get("expires_at"),
        account: Account {
            id: r.get("id"),
            email: r.get("email"),
            username: r.get("username"),
            avatar: r.get("avatar"),
            created_at: r.get("created_at"),
        },
    }))
}

/// Remove a session; returns whether it existed
pub async fn delete(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM auth_sessions WHERE token_hash = $1")
        .bind(token_digest(token))
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop expired sessions for an account
pub async fn purge_expired(pool: &PgPool, account_id: Uuid) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM auth_sessions WHERE account_id = $1 AND expires_at <= NOW()")
            .bind(account_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_digest_hides_token() {
        let token = "9f2c4a7e1b3d5f60";
        let digest = token_digest(token);

        assert_eq!(digest.len(), 64);
        assert!(!digest.contains(token));
        assert_eq!(digest, token_digest(token));
        assert_ne!(digest, token_digest("9f2c4a7e1b3d5f61"));
    }

    #[test]
    fn test_token_digest_known_value() {
        assert_eq!(
            token_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
