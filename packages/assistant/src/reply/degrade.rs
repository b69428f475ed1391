//! Plain-text recovery for replies whose JSON envelope never parses.
//!
//! This is an approximation. It strips envelope key names and JSON
//! punctuation from the raw text, which also removes legitimate commas,
//! quotes and brackets from the reply itself.

/// Raw text must be longer than this (in characters) before a broken
/// envelope is degraded while streaming.
pub const DEGRADE_THRESHOLD_CHARS: usize = 500;

/// Envelope key names removed before punctuation.
pub const ENVELOPE_KEY_TOKENS: [&str; 6] = [
    r#""options":"#,
    r#""type":"#,
    r#""content":"#,
    r#""thoughtful":"#,
    r#""concise":"#,
    r#""friendly":"#,
];

/// JSON punctuation removed after key names.
pub const PUNCTUATION: [char; 6] = ['{', '}', '"', '[', ']', ','];

/// Whether streaming text is long enough to degrade.
pub fn exceeds_threshold(raw: &str) -> bool {
    raw.chars().count() > DEGRADE_THRESHOLD_CHARS
}

/// Strip envelope tokens and punctuation, then trim.
pub fn strip_envelope(raw: &str) -> String {
    let mut text = raw.to_string();
    for token in ENVELOPE_KEY_TOKENS {
        text = text.replace(token, "");
    }
    text.retain(|c| !PUNCTUATION.contains(&c));
    text.trim().to_string()
}
