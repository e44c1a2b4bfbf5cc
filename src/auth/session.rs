//! Server-side session rows.
//!
//! One row per issued token. A row is honoured while `now < expires_at`; deleting it
//! revokes the token immediately, even though its signature stays valid until expiry.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::auth::token::TOKEN_TTL_SECONDS;

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records `token` for `user_id`, expiring 24 hours from now.
    ///
    /// A duplicate token violates the UNIQUE constraint and is returned as a storage error.
    pub async fn create(&self, user_id: i64, token: &str) -> Result<(), sqlx::Error> {
        self.create_at(user_id, token, Utc::now()).await
    }

    pub async fn create_at(
        &self,
        user_id: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let expires_at = now + Duration::seconds(TOKEN_TTL_SECONDS);

        sqlx::query("INSERT INTO sessions (user_id, token, expires_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(token)
            .bind(expires_at.timestamp())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// True iff a row matches both `token` and `user_id` and has not yet expired.
    pub async fn is_valid(&self, token: &str, user_id: i64) -> Result<bool, sqlx::Error> {
        self.is_valid_at(token, user_id, Utc::now()).await
    }

    pub async fn is_valid_at(
        &self,
        token: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (i64,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM sessions WHERE token = ? AND user_id = ? AND expires_at > ?)",
        )
        .bind(token)
        .bind(user_id)
        .bind(now.timestamp())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    /// Removes the row for `token`, if any. Deleting an unknown token is not an error.
    pub async fn delete(&self, token: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        log::debug!("Deleted {} session row(s)", result.rows_affected());
        Ok(())
    }

    /// Deletes every session that has expired, returning how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, sqlx::Error> {
        self.purge_expired_at(Utc::now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
