//! Password reset token model and DTOs.

use ken_core::reset_token::{token_state, TokenState};
use ken_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use validator::Validate;

/// A row from the `password_reset_tokens` table.
///
/// The token string is opaque to the store. `used` only ever moves from
/// `false` to `true`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PasswordResetToken {
    pub id: DbId,
    pub user_id: DbId,
    #[serde(skip_serializing)]
    pub token: String,
    pub expires_at: Timestamp,
    pub used: bool,
    pub created_at: Timestamp,
}

impl PasswordResetToken {
    /// Where this token stands at instant `now`.
    pub fn state_at(&self, now: Timestamp) -> TokenState {
        token_state(self.used, self.expires_at, now)
    }

    /// Whether the token could still be redeemed at instant `now`.
    pub fn is_redeemable_at(&self, now: Timestamp) -> bool {
        self.state_at(now).is_redeemable()
    }
}

/// DTO for storing a freshly issued token.
#[derive(Debug, Validate)]
pub struct CreatePasswordResetToken {
    pub user_id: DbId,
    #[validate(length(max = 255))]
    pub token: String,
    pub expires_at: Timestamp,
}
