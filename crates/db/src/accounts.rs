//! Account queries

use common::models::Account;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Stored password material for a login check
#[derive(Debug, Clone)]
pub struct Credentials {
    pub account: Account,
    /// PHC string, algorithm and salt included
    pub password_hash: String,
}

fn account_from_row(row: &PgRow) -> Account {
    Account {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        avatar: row.get("avatar"),
        created_at: row.get("created_at"),
    }
}

/// Insert a new account together with its empty progress record
pub async fn create(
    pool: &PgPool,
    email: &str,
    username: &str,
    avatar: Option<&str>,
    password_hash: &str,
) -> Result<Account, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r#"
        INSERT INTO accounts (id, email, username, avatar, password_hash, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING id, email, username, avatar, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(username)
    .bind(avatar)
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await?;

    let account = account_from_row(&row);

    sqlx::query(
        r#"
        INSERT INTO profiles (id, last_login)
        VALUES ($1, NOW())
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(account.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(account)
}

/// Whether the email or username is already registered
pub async fn exists(pool: &PgPool, email: &str, username: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM accounts
            WHERE LOWER(email) = LOWER($1) OR LOWER(username) = LOWER($2)
        ) as exists
        "#,
    )
    .bind(email)
    .bind(username)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<bool, _>("exists"))
}

/// Look up login material by email
pub async fn get_credentials(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Credentials>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, email, username, avatar, created_at, password_hash
        FROM accounts
        WHERE LOWER(email) = LOWER($1)
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Credentials {
        account: account_from_row(&r),
        password_hash: r.get("password_hash"),
    }))
}
