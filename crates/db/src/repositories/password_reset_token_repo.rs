//! Repository for the `password_reset_tokens` table.
//!
//! Tokens are stored, looked up and redeemed here; issuing the token string
//! itself happens elsewhere. No statement in this module ever sets
//! `used = false`.

use ken_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::password_reset_token::{CreatePasswordResetToken, PasswordResetToken};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, token, expires_at, used, created_at";

/// Provides storage and one-shot redemption for reset tokens.
pub struct PasswordResetTokenRepo;

impl PasswordResetTokenRepo {
    /// Store a new token. `used` starts `false`.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePasswordResetToken,
    ) -> Result<PasswordResetToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO password_reset_tokens (user_id, token, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PasswordResetToken>(&query)
            .bind(input.user_id)
            .bind(&input.token)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find the newest row holding `token`, whatever its state.
    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM password_reset_tokens
             WHERE token = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, PasswordResetToken>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Find a row holding `token` that is unused and unexpired at `now`.
    pub async fn find_redeemable(
        pool: &PgPool,
        token: &str,
        now: Timestamp,
    ) -> Result<Option<PasswordResetToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM password_reset_tokens
             WHERE token = $1 AND used = false AND expires_at > $2
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, PasswordResetToken>(&query)
            .bind(token)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Flip `used` from `false` to `true`.
    ///
    /// Returns `true` only for the call that performed the flip; a token that
    /// is already used (or missing) yields `false`.
    pub async fn mark_used(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used = true WHERE id = $1 AND used = false",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically find and consume a redeemable token.
    ///
    /// Among concurrent callers presenting the same token, at most one gets
    /// the row back; the rest get `None`. Expired tokens are never consumed.
    pub async fn redeem(
        pool: &PgPool,
        token: &str,
        now: Timestamp,
    ) -> Result<Option<PasswordResetToken>, sqlx::Error> {
        let query = format!(
            "UPDATE password_reset_tokens SET used = true
             WHERE id = (
                 SELECT id FROM password_reset_tokens
                 WHERE token = $1 AND used = false AND expires_at > $2
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1
                 FOR UPDATE
             )
               AND used = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PasswordResetToken>(&query)
            .bind(token)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// List a user's tokens, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PasswordResetToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM password_reset_tokens
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, PasswordResetToken>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Delete tokens that expired before `cutoff`, or were used and created
    /// before `cutoff`. Returns the count of deleted rows.
    ///
    /// Mirrors [`ken_core::reset_token::is_purgeable`].
    pub async fn purge_stale(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM password_reset_tokens
             WHERE expires_at < $1 OR (used = true AND created_at < $1)",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
