//! Locale selection and bilingual text pairs.
//!
//! Exactly two locales are supported: English (default) and French. The
//! active locale is derived from the page's declared language attribute,
//! first two letters, case-insensitively; anything that does not start with
//! "fr" is English.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl Locale {
    /// Derives the locale from a page `lang` attribute (e.g. `"fr-CA"`, `"EN"`).
    pub fn from_lang_attr(lang: &str) -> Self {
        let prefix: String = lang.chars().take(2).collect::<String>().to_lowercase();
        if prefix == "fr" {
            Locale::Fr
        } else {
            Locale::En
        }
    }

    /// Picks the matching half of an English/French pair.
    pub fn pick<'a>(self, en: &'a str, fr: &'a str) -> &'a str {
        match self {
            Locale::En => en,
            Locale::Fr => fr,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_attr_prefix_selects_locale() {
        assert_eq!(Locale::from_lang_attr("en"), Locale::En);
        assert_eq!(Locale::from_lang_attr("en-CA"), Locale::En);
        assert_eq!(Locale::from_lang_attr("fr"), Locale::Fr);
        assert_eq!(Locale::from_lang_attr("FR-ca"), Locale::Fr);
        assert_eq!(Locale::from_lang_attr("Fredonian"), Locale::Fr);
    }

    #[test]
    fn unknown_or_empty_defaults_to_english() {
        assert_eq!(Locale::from_lang_attr(""), Locale::En);
        assert_eq!(Locale::from_lang_attr("de-DE"), Locale::En);
    }
}
