//! Small helpers for logging, LLM output cleanup and timestamps.

use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```\s*\z")
        .expect("code fence pattern is valid")
});

/// Truncate a string for logging purposes.
///
/// Strings longer than `max` bytes are cut at the nearest character boundary
/// at or below `max`, with `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// The first `max` characters of `s`.
pub fn take_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// LLM replies cut off by a token limit fail with an EOF error; those are
/// worth asking again for.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Remove a Markdown code fence wrapped around an LLM reply.
///
/// ```ignore
/// assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
/// ```
pub fn strip_code_fence(reply: &str) -> &str {
    match CODE_FENCE.captures(reply).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => reply.trim(),
    }
}

/// Current UTC time as RFC 3339 with second precision.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
