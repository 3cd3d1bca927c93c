//! Log Redaction
//!
//! Scrubs API keys and bearer tokens from strings before they are logged or
//! echoed back to a client.

use once_cell::sync::Lazy;
use regex::Regex;

static API_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(gsk_[A-Za-z0-9]{16,})|(sk-[A-Za-z0-9\-_]{20,})|(Bearer\s+[A-Za-z0-9\-\._~+/]+=*)")
        .expect("valid redaction pattern")
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_groq_keys_and_bearer_tokens() {
        let raw = "Invalid API Key gsk_abcdefghijklmnopqrstuvwx sent as Bearer eyJhbGciOiJIUzI1NiJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("gsk_abcdefghijklmnopqrstuvwx"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiJ9"));
        assert!(clean.starts_with("Invalid API Key [REDACTED_TOKEN]"));
    }

    #[test]
    fn leaves_plain_text_alone() {
        let raw = "Groq returned 503 Service Unavailable";
        assert_eq!(redact_sensitive_data(raw), raw);
    }
}
