//! Email normalization, format checks and mention scanning

use once_cell::sync::Lazy;
use regex::Regex;

const LOCAL_PART: &str = r"[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+";
const DOMAIN: &str =
    r"[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{}@{}$", LOCAL_PART, DOMAIN)).expect("valid email regex")
});
static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("{}@{}", LOCAL_PART, DOMAIN)).expect("valid mention regex"));

/// Trim surrounding whitespace and lowercase
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Whole-string email format check (no normalization applied)
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Find every email-shaped substring in free text, normalized, in order
/// of appearance. Duplicates are kept; callers dedupe.
pub fn extract_mentions(text: &str) -> Vec<String> {
    MENTION_RE
        .find_iter(text)
        .map(|m| normalize_email(m.as_str()))
        .collect()
}
