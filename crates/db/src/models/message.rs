//! Chat message model and DTOs.

use std::fmt;
use std::str::FromStr;

use ken_core::error::CoreError;
use ken_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Who authored a message. Maps to the `chat_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "chat_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(CoreError::Validation(format!(
                "role must be 'user' or 'assistant', got '{other}'"
            ))),
        }
    }
}

/// A row from the `chats` table: one turn of a conversation.
///
/// `user_id` duplicates the owner of `chat_id` so per-user queries skip the
/// join. Writers must keep the two consistent.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub user_id: DbId,
    pub chat_id: DbId,
    pub message: String,
    pub role: MessageRole,
    pub created_at: Timestamp,
}

/// DTO for appending a turn to a session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessage {
    pub user_id: DbId,
    pub chat_id: DbId,
    pub message: String,
    pub role: MessageRole,
}
