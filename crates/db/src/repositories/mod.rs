//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Store errors are returned
//! unchanged; see [`crate::error::StoreViolation`] to classify them.

pub mod chat_title_repo;
pub mod message_repo;
pub mod password_reset_token_repo;
pub mod user_repo;

pub use chat_title_repo::ChatTitleRepo;
pub use message_repo::MessageRepo;
pub use password_reset_token_repo::PasswordResetTokenRepo;
pub use user_repo::UserRepo;
