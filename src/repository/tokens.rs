//! Token tracking repository: one current token id per user plus the
//! append-only revocation list consulted on every authenticated request.

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Clone)]
pub struct TokensRepository {
    pool: Pool<Postgres>,
}

impl TokensRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// The user's live token id, if a login has been recorded
    pub async fn current_jti(&self, user_id: Uuid) -> AppResult<Option<Uuid>> {
        let jti = sqlx::query_scalar::<_, Uuid>(
            "SELECT jti FROM current_tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(jti)
    }

    /// Record the token issued at login, overwriting any previous one
    pub async fn set_current(&self, user_id: Uuid, jti: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO current_tokens (user_id, jti)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET jti = EXCLUDED.jti
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Drop the current-token record, used when the user row is deleted
    pub async fn clear_current(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM current_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append a token id to the revocation list. Revoking the same id twice
    /// is harmless; the list is never deduplicated or pruned.
    pub async fn revoke(&self, jti: Uuid) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO revoked_tokens (id, jti, revoked_at) VALUES ($1, $2, $3)",
        )
        .bind(Uuid::new_v4())
        .bind(jti)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Membership check gating every authenticated request
    pub async fn is_revoked(&self, jti: Uuid) -> AppResult<bool> {
        let revoked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;
        Ok(revoked)
    }
}
