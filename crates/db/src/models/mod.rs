//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Validate` create DTO for inserts, with limits matching the column widths

pub mod chat_title;
pub mod message;
pub mod password_reset_token;
pub mod user;
