//! # Database Persistence Layer
//!
//! SQLite persistence for registered users via SQLx.
//!
//! The database is **optional**. When `DATABASE_URL` is set the service
//! stores users in the `users` table and they survive restarts. When it is
//! absent users live in memory only, which suits development and tests.
//!
//! Artifacts are not stored here; the Artifact Manager owns them on disk.

pub mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Open the connection pool and run migrations.
///
/// Returns `None` without a URL (in-memory mode). Returns `Err` if the URL
/// is set but the connection or a migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<SqlitePool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::warn!("DATABASE_URL not set, users are kept in memory and lost on restart");
        return Ok(None);
    };

    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    // Each connection to an in-memory database is a separate database.
    let max_connections = if url.contains(":memory:") { 1 } else { 8 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    tracing::info!("connected to SQLite");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(Some(pool))
}
