//! Day token recognition (`So. 07.12.2025:`, `Mo 08.12.`).

use std::sync::OnceLock;

use regex::Regex;

use crate::types::DayToken;

/// Two-letter weekday (dot optional), whitespace, `DD.MM.`, optional year, optional colon.
#[allow(clippy::expect_used)]
fn day_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[A-Za-zÄÖÜäöü]{2}\.?\s+[0-9]{2}\.[0-9]{2}\.(?:[0-9]{4})?:?")
            .expect("day token pattern is valid")
    })
}

/// A text opens a day when its day token begins within this many characters.
pub const HEADER_WINDOW: usize = 16;

/// A day token found in a fragment of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayMatch {
    pub token: DayToken,
    /// Byte offset of the token in the searched text
    pub start: usize,
    /// Byte offset just past the token, including a trailing colon
    pub end: usize,
}

/// Find the first day token in `text`.
pub fn extract_day(text: &str) -> Option<DayMatch> {
    day_token_pattern().find_iter(text).find_map(|m| {
        // Reject matches glued to a preceding letter ("Tag Mo 08.12." is fine, "xMo 08.12." is not)
        let glued = text[..m.start()]
            .chars()
            .next_back()
            .is_some_and(char::is_alphabetic);
        if glued {
            return None;
        }
        let token = m.as_str().trim_end_matches(':');
        Some(DayMatch {
            token: DayToken::new(token.to_string()),
            start: m.start(),
            end: m.end(),
        })
    })
}

/// The day token of `text` if it starts within [`HEADER_WINDOW`] characters.
pub fn header_day(text: &str) -> Option<DayMatch> {
    extract_day(text).filter(|m| text[..m.start].chars().count() < HEADER_WINDOW)
}
