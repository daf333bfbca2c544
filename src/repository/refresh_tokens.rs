//! Refresh token repository

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{error::AppResult, models::user::RefreshToken};

#[derive(Clone)]
pub struct RefreshTokensRepository {
    pool: Pool<Postgres>,
}

impl RefreshTokensRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Persist a freshly issued refresh token
    pub async fn insert(
        &self,
        token: &str,
        user_id: i32,
        expiry_date: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("INSERT INTO refresh_tokens (token, user_id, expiry_date) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expiry_date)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Look up a stored token
    pub async fn find(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshToken>(
            "SELECT id, token, user_id, expiry_date FROM refresh_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Delete a single token (logout, expiry cleanup)
    pub async fn delete(&self, token: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Revoke every session of a user (password change)
    pub async fn revoke_for_user(&self, user_id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete every token of a user inside the account deletion cascade
    pub async fn delete_for_user(&self, conn: &mut PgConnection, user_id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
