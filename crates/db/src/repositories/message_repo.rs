//! Repository for the `chats` table (individual messages).
//!
//! Messages are append-only: there is no update or delete here. They
//! disappear only when their session or their user is deleted.

use ken_core::types::DbId;
use sqlx::PgPool;

use crate::models::message::{CreateMessage, Message, MessageRole};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, chat_id, message, role, created_at";

/// Provides append and read operations for messages.
pub struct MessageRepo;

impl MessageRepo {
    /// Insert a message with both foreign keys as given.
    ///
    /// The store only checks that `user_id` and `chat_id` exist, not that
    /// they agree. Prefer [`MessageRepo::create_in_owned_chat`] when the
    /// pair comes from untrusted input.
    pub async fn create(pool: &PgPool, input: &CreateMessage) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO chats (user_id, chat_id, message, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(input.user_id)
            .bind(input.chat_id)
            .bind(&input.message)
            .bind(input.role)
            .fetch_one(pool)
            .await
    }

    /// Insert a message only if `chat_id` is owned by `user_id`.
    ///
    /// Keeps the denormalized `user_id` in step with the session owner.
    /// Returns `None` when the session is missing or owned by another user.
    pub async fn create_in_owned_chat(
        pool: &PgPool,
        input: &CreateMessage,
    ) -> Result<Option<Message>, sqlx::Error> {
        let query = format!(
            "INSERT INTO chats (user_id, chat_id, message, role)
             SELECT ct.user_id, ct.id, $3, $4
             FROM chat_titles ct
             WHERE ct.id = $2 AND ct.user_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(input.user_id)
            .bind(input.chat_id)
            .bind(&input.message)
            .bind(input.role)
            .fetch_optional(pool)
            .await
    }

    /// List a session's messages in conversation order.
    pub async fn list_for_chat(pool: &PgPool, chat_id: DbId) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM chats
             WHERE chat_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(chat_id)
            .fetch_all(pool)
            .await
    }

    /// List every message a user has in any session, oldest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM chats
             WHERE user_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Count a session's messages written by `role`.
    pub async fn count_for_chat_by_role(
        pool: &PgPool,
        chat_id: DbId,
        role: MessageRole,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chats WHERE chat_id = $1 AND role = $2")
                .bind(chat_id)
                .bind(role)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Count every message a user has across all sessions.
    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chats WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
