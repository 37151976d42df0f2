//! Operator tooling for the chat-history store: configuration, schema
//! provisioning commands and the stale reset-token reaper.

pub mod config;
pub mod reaper;
