//! Strict phone input filtering.
//!
//! While the user is typing, only digits and `+()-` survive; everything
//! else is stripped immediately. On loss of focus the punctuation itself is
//! stripped too, so the validated value is digits-only.

use once_cell::sync::Lazy;
use regex::Regex;

/// The `pattern` attribute value advertised on filtered inputs. Hyphen
/// first so the character class carries no range.
pub const PATTERN_ATTR: &str = "[-0-9()+]*";

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9()+-]").unwrap());
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[()+-]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Live sanitization applied on every input: keep digits and `+()-` only.
pub fn sanitize(value: &str) -> String {
    DISALLOWED.replace_all(value, "").to_string()
}

/// Blur normalization: strip the allowed punctuation and any whitespace,
/// leaving digits only.
pub fn finalize(value: &str) -> String {
    let no_punct = PUNCTUATION.replace_all(value, "");
    WHITESPACE.replace_all(&no_punct, "").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_allowed_punctuation() {
        assert_eq!(sanitize("(613) 555-0123"), "(613)555-0123");
        assert_eq!(sanitize("+1 ext. 42"), "+142");
        assert_eq!(sanitize("abc"), "");
    }

    #[test]
    fn finalize_yields_digits_only() {
        assert_eq!(finalize("(613) 555-0123"), "6135550123");
        assert_eq!(finalize("+1-800-555-0199"), "18005550199");
        assert_eq!(finalize(""), "");
    }
}
