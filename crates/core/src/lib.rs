//! Domain rules shared by the storage layer and its operators.
//!
//! Nothing in this crate touches the database; it holds the column limits,
//! title rules and reset-token validity logic the repositories build on.

pub mod error;
pub mod limits;
pub mod reset_token;
pub mod title;
pub mod types;
