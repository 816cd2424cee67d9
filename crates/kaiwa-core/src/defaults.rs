//! Default limits and formatting policy shared across crates.

use chrono::{DateTime, Utc};

/// Default message count for user-facing history fetches.
pub const HISTORY_LIMIT: i64 = 50;

/// Most-recent turns handed to the completion backend (5 exchanges).
/// Fixed policy, independent of retrieval mode.
pub const CONVERSATION_WINDOW: i64 = 10;

/// Default chat-message window for facilitator prompts.
pub const FACILITATOR_WINDOW: i64 = 30;

/// Maximum web-search results folded into a prompt.
pub const MAX_SEARCH_RESULTS: usize = 5;

/// Per-document excerpt cap (characters) when concatenating extracted text
/// into a prompt. Keeps multi-document prompts inside backend context limits.
pub const DOCUMENT_EXCERPT_CHARS: usize = 4000;

/// Format a timestamp for the realtime wire (`messageReceived.createdAt`).
///
/// Clients display this string as-is.
pub fn format_wire_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_timestamp_is_time_of_day() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(format_wire_timestamp(&ts), "09:05:07");
    }
}
