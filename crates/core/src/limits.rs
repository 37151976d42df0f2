//! Column width limits.
//!
//! These must match the `VARCHAR(n)` widths declared in `ken_db::schema` and
//! the `validator` bounds on the `Create*` DTOs; `ken_db` tests hold all
//! three in step. Widths count characters, not bytes.

pub const USERNAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 100;
pub const PASSWORD_HASH_MAX_LEN: usize = 255;
pub const CHAT_TITLE_MAX_LEN: usize = 100;
pub const LAST_LOCATION_MAX_LEN: usize = 100;
pub const RESET_TOKEN_MAX_LEN: usize = 255;

/// Title assigned to a chat session when none is given.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";
