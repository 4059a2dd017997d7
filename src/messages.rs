//! Localized message resolution.
//!
//! A field's error message is resolved through a fixed preference chain:
//! a field-level override attribute (`data-msg-{key}-{lang}`), then a
//! platform-supplied message (the stock required validator attached to the
//! field's hidden filename control, stripped of markup), then the built-in
//! bilingual defaults below. Summary entries are numbered `Error N: …` /
//! `Erreur N : …`, and records with no resolvable message fall back to the
//! visible label text plus a localized required suffix.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::RuleFailure;
use crate::locale::Locale;

/// Built-in default message for a file-rule failure.
///
/// The French strings intentionally carry a non-breaking space and a curly
/// apostrophe; they are user-facing copy, not identifiers.
pub fn default_message(key: RuleFailure, locale: Locale) -> &'static str {
    match (locale, key) {
        (Locale::En, RuleFailure::Required) => "This file is required.",
        (Locale::En, RuleFailure::ZeroByte) => {
            "The selected file is empty (0 bytes). Please choose a non-empty file."
        }
        (Locale::En, RuleFailure::MaxSize) => {
            "The file is too large. Maximum file size is {MB} MB."
        }
        (Locale::En, RuleFailure::FileTypes) => {
            "The file type is not allowed. Allowed types: {list}."
        }
        (Locale::Fr, RuleFailure::Required) => "Ce fichier est obligatoire.",
        (Locale::Fr, RuleFailure::ZeroByte) => {
            "Le fichier sélectionné est vide (0\u{a0}octet). Veuillez choisir un fichier non vide."
        }
        (Locale::Fr, RuleFailure::MaxSize) => {
            "Le fichier est trop volumineux. La taille maximale est de {MB}\u{a0}Mo."
        }
        (Locale::Fr, RuleFailure::FileTypes) => {
            "Le type de fichier n\u{2019}est pas autorisé. Types permis\u{a0}: {list}."
        }
        // Custom rules and evaluation faults carry their own text.
        _ => "",
    }
}

/// The override attribute name for a failure key, e.g. `data-msg-max-en`.
pub fn override_attr(key: RuleFailure, locale: Locale) -> Option<String> {
    let short = match key {
        RuleFailure::Required => "required",
        RuleFailure::ZeroByte => "zero",
        RuleFailure::MaxSize => "max",
        RuleFailure::FileTypes => "type",
        _ => return None,
    };
    Some(format!("data-msg-{}-{}", short, locale.as_str()))
}

/// Interpolates the configured max size, in megabytes to one decimal place.
pub fn interpolate_max_size(template: &str, max_bytes: u64) -> String {
    let mb = max_bytes as f64 / (1024.0 * 1024.0);
    template.replace("{MB}", &format!("{mb:.1}"))
}

/// Interpolates the allowed-extension list.
pub fn interpolate_file_types(template: &str, allowed: &[String]) -> String {
    template.replace("{list}", &allowed.join(", "))
}

/// Numbered summary entry text.
pub fn numbered(locale: Locale, n: usize, text: &str) -> String {
    match locale {
        Locale::En => format!("Error {n}: {text}"),
        Locale::Fr => format!("Erreur {n} : {text}"),
    }
}

/// Localized summary heading for an error count (`n > 0`).
pub fn summary_heading(locale: Locale, n: usize) -> String {
    match locale {
        Locale::En => format!(
            "The form could not be submitted because {n} error{}",
            if n > 1 { "s were found." } else { " was found." }
        ),
        Locale::Fr => format!(
            "Le formulaire n'a pu être soumis car {n} erreur{}",
            if n > 1 {
                "s ont été trouvées."
            } else {
                " a été trouvée."
            }
        ),
    }
}

/// Fallback for records that carry no resolvable message: the visible label
/// text plus a localized required suffix.
pub fn required_fallback(locale: Locale, label_text: Option<&str>) -> String {
    let suffix = locale.pick("is a required field.", "est obligatoire.");
    match label_text.map(strip_required_phrase).filter(|t| !t.is_empty()) {
        Some(label) => format!("{label} {suffix}"),
        None => suffix.to_string(),
    }
}

static REQUIRED_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\((required|obligatoire)\)\s*$").unwrap());
static ANY_REQUIRED_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\((required|obligatoire)\)\s*").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strips a trailing `(required)` / `(obligatoire)` phrase from label text.
pub fn strip_required_phrase(label: &str) -> String {
    REQUIRED_PHRASE.replace(label, "").trim().to_string()
}

/// Strips every `(required)` / `(obligatoire)` phrase, wherever it appears.
pub fn strip_all_required_phrases(label: &str) -> String {
    ANY_REQUIRED_PHRASE.replace_all(label, " ").trim().to_string()
}

/// Reduces an HTML fragment (typically an error anchor) to its text content,
/// with whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    let text = TAG.replace_all(html, "");
    WS.replace_all(text.trim(), " ").to_string()
}

/// Wraps an error message in the anchor markup the summary links use.
pub fn anchor_markup(field_id: &str, text: &str) -> String {
    format!("<a href='#{field_id}_label' referenceControlId={field_id}>{text}</a>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_size_interpolates_one_decimal() {
        let msg = interpolate_max_size(default_message(RuleFailure::MaxSize, Locale::En), 4_194_304);
        assert_eq!(msg, "The file is too large. Maximum file size is 4.0 MB.");
        let msg = interpolate_max_size(default_message(RuleFailure::MaxSize, Locale::En), 5_500_000);
        assert!(msg.contains("5.2 MB"));
    }

    #[test]
    fn file_types_interpolates_list() {
        let allowed = vec!["pdf".to_string(), "jpg".to_string()];
        let msg =
            interpolate_file_types(default_message(RuleFailure::FileTypes, Locale::En), &allowed);
        assert!(msg.contains("Allowed types: pdf, jpg."));
    }

    #[test]
    fn heading_pluralizes_per_locale() {
        assert_eq!(
            summary_heading(Locale::En, 1),
            "The form could not be submitted because 1 error was found."
        );
        assert_eq!(
            summary_heading(Locale::En, 3),
            "The form could not be submitted because 3 errors were found."
        );
        assert!(summary_heading(Locale::Fr, 1).ends_with("1 erreur a été trouvée."));
        assert!(summary_heading(Locale::Fr, 2).ends_with("2 erreurs ont été trouvées."));
    }

    #[test]
    fn numbering_formats_per_locale() {
        assert_eq!(numbered(Locale::En, 2, "x"), "Error 2: x");
        assert_eq!(numbered(Locale::Fr, 2, "x"), "Erreur 2 : x");
    }

    #[test]
    fn fallback_uses_label_and_strips_required_suffix() {
        assert_eq!(
            required_fallback(Locale::En, Some("Full name (required)")),
            "Full name is a required field."
        );
        assert_eq!(required_fallback(Locale::Fr, None), "est obligatoire.");
        assert_eq!(required_fallback(Locale::En, Some("  ")), "is a required field.");
    }

    #[test]
    fn html_stripping_collapses_whitespace() {
        let html = "<a href='#f_label'>\n  Full name\n  is required.\n</a>";
        assert_eq!(html_to_text(html), "Full name is required.");
    }
}
