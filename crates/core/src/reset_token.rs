//! Password reset token validity.
//!
//! A token row carries a `used` flag and an `expires_at` instant. It may be
//! redeemed once, and only before it expires. The flag only ever moves from
//! `false` to `true`.

use serde::Serialize;

use crate::types::Timestamp;

/// Where a reset token stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    /// Unused and not yet expired.
    Redeemable,
    /// Already redeemed.
    Used,
    /// Unused, but past `expires_at`.
    Expired,
}

impl TokenState {
    pub fn is_redeemable(self) -> bool {
        self == TokenState::Redeemable
    }
}

/// Classify a token at instant `now`.
///
/// A token whose `expires_at` equals `now` is already expired.
pub fn token_state(used: bool, expires_at: Timestamp, now: Timestamp) -> TokenState {
    if used {
        TokenState::Used
    } else if now >= expires_at {
        TokenState::Expired
    } else {
        TokenState::Redeemable
    }
}

/// Whether a token row may be deleted by the stale-token reaper.
///
/// A row is purgeable once it expired before `cutoff`, or once it was used
/// and created before `cutoff`. The table records no redemption time, so
/// `created_at` stands in for it.
pub fn is_purgeable(
    used: bool,
    created_at: Timestamp,
    expires_at: Timestamp,
    cutoff: Timestamp,
) -> bool {
    expires_at < cutoff || (used && created_at < cutoff)
}
