//! Postgres storage for accounts, login sessions and player progress

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info};

pub mod accounts;
pub mod leaderboard;
pub mod profiles;
pub mod sessions;


/// Schema scripts in apply order. Each one is idempotent.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    include_str!("../../../migrations/001_initial.sql"),
)];

/// Open a pool sized for the API server
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    info!("Connecting to database ({} connections max)", max_connections);
    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    info!("Database connected");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    for (name, sql) in MIGRATIONS {
        debug!("Applying migration {}", name);
        sqlx::raw_sql(sql).execute(pool).await?;
    }
    info!("Schema up to date ({} migrations)", MIGRATIONS.len());
    Ok(())
}
