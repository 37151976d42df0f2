//! Chat session title rules.
//!
//! A new session starts as [`DEFAULT_CHAT_TITLE`]. When the first user turn
//! arrives the title is replaced with a short summary of that turn; explicit
//! renames are clamped to the column width.

use crate::limits::{CHAT_TITLE_MAX_LEN, DEFAULT_CHAT_TITLE};

/// Longest derived title before it gets an ellipsis.
const DERIVED_TITLE_MAX_CHARS: usize = 30;

/// Number of leading words kept from the first message.
const DERIVED_TITLE_WORDS: usize = 4;

/// Derive a session title from the first user message.
///
/// Keeps the first four whitespace-separated words. Anything longer than 30
/// characters is cut to 27 and suffixed with `...`. Blank input yields
/// [`DEFAULT_CHAT_TITLE`].
///
/// # Examples
///
/// ```
/// use ken_core::title::derive_chat_title;
///
/// assert_eq!(derive_chat_title("Where should I go this summer?"), "Where should I go");
/// assert_eq!(derive_chat_title("   "), "New Chat");
/// ```
pub fn derive_chat_title(text: &str) -> String {
    let joined = text
        .split_whitespace()
        .take(DERIVED_TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        return DEFAULT_CHAT_TITLE.to_string();
    }

    if joined.chars().count() <= DERIVED_TITLE_MAX_CHARS {
        return joined;
    }

    let mut cut: String = joined.chars().take(DERIVED_TITLE_MAX_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

/// Truncate a user-supplied title to the `chat_titles.title` column width.
pub fn clamp_title(text: &str) -> String {
    text.chars().take(CHAT_TITLE_MAX_LEN).collect()
}
