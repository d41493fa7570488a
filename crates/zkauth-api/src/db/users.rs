//! User persistence operations.
//!
//! All functions take a `&SqlitePool` and operate on the `users` table.
//! Create-once is enforced by the primary key: inserts use
//! `ON CONFLICT DO NOTHING` and report whether a row was written.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use zkauth_auth::StoreError;
use zkauth_core::{Commitment, UserRecord, Username};

/// Insert a user unless the username exists.
///
/// Returns `false` when the username was already taken; the existing row is
/// left untouched.
pub async fn insert(pool: &SqlitePool, record: &UserRecord) -> Result<bool, sqlx::Error> {
    let stored_hash = serde_json::to_string(&record.commitment)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize stored_hash: {e}")))?;

    let result = sqlx::query(
        "INSERT INTO users (username, stored_hash, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (username) DO NOTHING",
    )
    .bind(record.username.as_str())
    .bind(&stored_hash)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Fetch a user by name.
pub async fn get_by_username(
    pool: &SqlitePool,
    username: &Username,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        "SELECT username, stored_hash, created_at FROM users WHERE username = ?1",
    )
    .bind(username.as_str())
    .fetch_optional(pool)
    .await
}

/// Number of registered users.
pub async fn count(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(u64::try_from(n).unwrap_or(0))
}

/// Raw `users` row.
#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub username: String,
    pub stored_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Parse into a domain record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the username or stored hash no
    /// longer validates.
    pub fn into_record(self) -> Result<UserRecord, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            username: self.username.clone(),
            reason,
        };
        let username = Username::new(self.username.as_str()).map_err(|e| corrupt(e.to_string()))?;
        let commitment: Commitment =
            serde_json::from_str(&self.stored_hash).map_err(|e| corrupt(e.to_string()))?;
        Ok(UserRecord {
            username,
            commitment,
            created_at: self.created_at,
        })
    }
}
