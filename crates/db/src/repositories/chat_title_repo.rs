//! Repository for the `chat_titles` table.

use ken_core::limits::DEFAULT_CHAT_TITLE;
use ken_core::title::{clamp_title, derive_chat_title};
use ken_core::types::DbId;
use sqlx::PgPool;

use crate::models::chat_title::{ChatTitle, CreateChatTitle};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, title, last_location, created_at, updated_at";

/// Provides CRUD operations for chat sessions.
///
/// Methods with a `user_id` parameter are ownership-scoped: a session that
/// belongs to another user behaves as if it did not exist.
pub struct ChatTitleRepo;

impl ChatTitleRepo {
    /// Start a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateChatTitle) -> Result<ChatTitle, sqlx::Error> {
        let query = format!(
            "INSERT INTO chat_titles (user_id, title, last_location)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChatTitle>(&query)
            .bind(input.user_id)
            .bind(input.title.as_deref().unwrap_or(DEFAULT_CHAT_TITLE))
            .bind(&input.last_location)
            .fetch_one(pool)
            .await
    }

    /// Find a session by ID regardless of owner.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ChatTitle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM chat_titles WHERE id = $1");
        sqlx::query_as::<_, ChatTitle>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a session by ID, only if `user_id` owns it.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<ChatTitle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM chat_titles WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, ChatTitle>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's sessions, most recently updated first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<ChatTitle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM chat_titles
             WHERE user_id = $1
             ORDER BY updated_at DESC, id DESC"
        );
        sqlx::query_as::<_, ChatTitle>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Count the sessions a user owns.
    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_titles WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Rename a session owned by `user_id`. The title is clamped to the
    /// column width rather than rejected.
    ///
    /// Returns `None` if no such session exists for this user.
    pub async fn rename(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        title: &str,
    ) -> Result<Option<ChatTitle>, sqlx::Error> {
        let query = format!(
            "UPDATE chat_titles SET title = $3
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChatTitle>(&query)
            .bind(id)
            .bind(user_id)
            .bind(clamp_title(title))
            .fetch_optional(pool)
            .await
    }

    /// Record (or clear, with `None`) the last location mentioned in a session.
    ///
    /// Returns `true` if the row was updated.
    pub async fn set_last_location(
        pool: &PgPool,
        id: DbId,
        location: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE chat_titles SET last_location = $2 WHERE id = $1")
            .bind(id)
            .bind(location)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the title with one derived from `first_message`, but only while
    /// the session holds exactly one user-authored message.
    ///
    /// Returns `true` if the title was replaced.
    pub async fn retitle_from_first_message(
        pool: &PgPool,
        id: DbId,
        first_message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE chat_titles SET title = $2
             WHERE id = $1
               AND (SELECT COUNT(*) FROM chats WHERE chat_id = $1 AND role = 'user') = 1",
        )
        .bind(id)
        .bind(derive_chat_title(first_message))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a session owned by `user_id`, together with its messages.
    ///
    /// Returns `false` if the session does not exist or belongs to someone else.
    pub async fn delete_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM chat_titles WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
