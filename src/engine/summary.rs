//! Error-summary assembly.
//!
//! Walks the registry once per pass, collapsing the several records a
//! composite widget carries into one numbered entry per logical field.
//! Hidden file-mirror records never surface here: an invalid one is forced
//! valid on sight so the page's validity flags cannot be wedged by a
//! control the user can neither see nor fix.

use std::collections::HashSet;

use crate::host::{Host, SummaryEntry};
use crate::locale::Locale;
use crate::messages;
use crate::registry::{self, ValidatorRegistry};
use crate::rules::FieldType;

use super::inline;

/// One deduplicated summary line, in registry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryItem {
    /// Normalized base id of the logical field.
    pub base: String,
    pub field_type: FieldType,
    pub failure: Option<crate::errors::RuleFailure>,
    /// Display text, already carrying its `Error N:` prefix.
    pub message: String,
}

/// Collects the current invalid set into display items. The first invalid
/// record for a base id supplies the message; later records for the same
/// base are skipped, so registry order decides which wording wins.
pub fn collect(
    registry: &mut ValidatorRegistry,
    host: &dyn Host,
    locale: Locale,
) -> Vec<SummaryItem> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut items: Vec<SummaryItem> = Vec::new();

    for rec in registry.iter_mut() {
        if rec.is_valid {
            continue;
        }
        if registry::is_hidden_file_mirror(&rec.field_id) {
            rec.is_valid = true;
            rec.failure = None;
            continue;
        }
        let base = registry::normalize_base(&rec.field_id);
        if !seen.insert(base.clone()) {
            continue;
        }
        let mut text = messages::html_to_text(&rec.error_message);
        if text.is_empty() {
            let label = host.label_text(&base);
            text = messages::required_fallback(locale, label.as_deref());
        }
        let field_type = inline::resolve_type(host, &base, rec.field_type);
        items.push(SummaryItem {
            base,
            field_type,
            failure: rec.failure,
            message: messages::numbered(locale, items.len() + 1, &text),
        });
    }
    items
}

/// Builds the rendered entries for the summary block. Each entry links to
/// the field's label and carries an accessible label repeating its number.
pub fn build_entries(locale: Locale, items: &[SummaryItem]) -> Vec<SummaryEntry> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let number = i + 1;
            SummaryEntry {
                number,
                field_id: item.base.clone(),
                anchor: format!("{}_label", item.base),
                message: item.message.clone(),
                aria_label: messages::numbered(locale, number, &item.message),
                kind: item.failure,
                field_type: item.field_type,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RuleFailure;
    use crate::host::PageModel;
    use crate::messages::anchor_markup;
    use crate::registry::{RuleId, ValidatorKind};

    fn invalid(
        registry: &mut ValidatorRegistry,
        field: &str,
        message: &str,
        failure: RuleFailure,
    ) {
        let id = registry
            .register(
                field,
                FieldType::Text,
                ValidatorKind::Custom(RuleId(0)),
                anchor_markup(field, message),
            )
            .unwrap();
        let rec = registry.get_mut(id).unwrap();
        rec.is_valid = false;
        rec.failure = Some(failure);
    }

    #[test]
    fn partner_records_collapse_to_one_numbered_entry() {
        let mut page = PageModel::new("en");
        page.add_text_field("contact", "Contact");
        let mut registry = ValidatorRegistry::new();
        invalid(&mut registry, "contact", "Contact is required", RuleFailure::Required);
        invalid(&mut registry, "contact_name", "Contact is required", RuleFailure::Required);
        invalid(&mut registry, "contact_value", "Contact is required", RuleFailure::Required);
        invalid(&mut registry, "other", "Other is required", RuleFailure::Required);

        let items = collect(&mut registry, &page, Locale::En);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].base, "contact");
        assert_eq!(items[0].message, "Error 1: Contact is required");
        assert_eq!(items[1].message, "Error 2: Other is required");
    }

    #[test]
    fn hidden_mirror_records_are_forced_valid_and_skipped() {
        let page = PageModel::new("en");
        let mut registry = ValidatorRegistry::new();
        invalid(&mut registry, "doc_hidden_filename", "ghost", RuleFailure::Required);

        let items = collect(&mut registry, &page, Locale::En);
        assert!(items.is_empty());
        assert!(registry.all_valid());
    }

    #[test]
    fn blank_messages_fall_back_to_the_field_label() {
        let mut page = PageModel::new("fr");
        page.add_text_field("ville", "Ville (obligatoire)");
        let mut registry = ValidatorRegistry::new();
        let id = registry
            .register("ville", FieldType::Text, ValidatorKind::Custom(RuleId(0)), String::new())
            .unwrap();
        registry.get_mut(id).unwrap().is_valid = false;

        let items = collect(&mut registry, &page, Locale::Fr);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].message, "Erreur 1 : Ville est obligatoire.");
    }

    #[test]
    fn entries_link_to_field_labels() {
        let entries = build_entries(
            Locale::En,
            &[SummaryItem {
                base: "doc".into(),
                field_type: FieldType::File,
                failure: Some(RuleFailure::MaxSize),
                message: "Error 1: too big".into(),
            }],
        );
        assert_eq!(entries[0].anchor, "doc_label");
        assert_eq!(entries[0].aria_label, "Error 1: Error 1: too big");
    }
}
