//! Chat session ("chat title") model and DTOs.

use ken_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `chat_titles` table.
///
/// `updated_at` is maintained by a trigger and moves on every update.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatTitle {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    /// Last location mentioned in the session, kept for follow-up turns.
    pub last_location: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for starting a new session. A `None` title falls back to
/// [`ken_core::limits::DEFAULT_CHAT_TITLE`].
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChatTitle {
    pub user_id: DbId,
    #[validate(length(max = 100))]
    pub title: Option<String>,
    #[validate(length(max = 100))]
    pub last_location: Option<String>,
}
