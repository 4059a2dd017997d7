//! Integer-range restriction and clamping.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D+").unwrap());

/// Options for one restricted integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
    /// Clamp out-of-range values on blur/change (default). When off, the
    /// value is left as-is for a validator to flag.
    pub clamp: bool,
    /// Allow the field to stay empty; otherwise empty becomes `min`.
    pub allow_empty: bool,
}

impl IntRange {
    pub fn new(min: i64, max: i64) -> Self {
        IntRange { min, max, clamp: true, allow_empty: true }
    }

    /// Input-time sanitization: digits only, with empty-to-min when empty
    /// values are not allowed.
    pub fn sanitize(&self, value: &str) -> String {
        let digits = NON_DIGIT.replace_all(value, "").to_string();
        if digits.is_empty() && !self.allow_empty {
            return self.min.to_string();
        }
        digits
    }

    /// Blur/change-time enforcement: sanitize, then clamp into `[min, max]`.
    pub fn enforce(&self, value: &str) -> String {
        let digits = self.sanitize(value);
        if digits.is_empty() {
            return digits;
        }
        if !self.clamp {
            return digits;
        }
        // Digit strings longer than i64 can only be over the max.
        let n = digits.parse::<i64>().unwrap_or(i64::MAX);
        if n < self.min {
            self.min.to_string()
        } else if n > self.max {
            self.max.to_string()
        } else {
            n.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_bounds_on_enforce() {
        let range = IntRange::new(0, 10_000);
        assert_eq!(range.enforce("99999"), "10000");
        assert_eq!(range.enforce("5"), "5");
        assert_eq!(range.enforce("007"), "7");
    }

    #[test]
    fn below_min_clamps_up() {
        let range = IntRange::new(10, 20);
        assert_eq!(range.enforce("3"), "10");
    }

    #[test]
    fn empty_becomes_min_unless_allowed() {
        let mut range = IntRange::new(1, 9);
        assert_eq!(range.enforce(""), "");
        range.allow_empty = false;
        assert_eq!(range.enforce(""), "1");
        assert_eq!(range.sanitize("abc"), "1");
    }

    #[test]
    fn sanitize_strips_non_digits() {
        let range = IntRange::new(0, 100);
        assert_eq!(range.sanitize("1a2b3"), "123");
    }

    #[test]
    fn clamp_off_leaves_out_of_range_values() {
        let mut range = IntRange::new(0, 10);
        range.clamp = false;
        assert_eq!(range.enforce("999"), "999");
    }

    #[test]
    fn overflowing_digit_strings_clamp_to_max() {
        let range = IntRange::new(0, 10_000);
        assert_eq!(range.enforce("99999999999999999999999"), "10000");
    }
}
