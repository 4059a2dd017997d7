//! Inline error presentation.
//!
//! One message node per field, painted next to the label, with the error
//! frame and `aria-invalid` on whichever control actually receives focus
//! for that widget type. Painting is idempotent and clearing a field that
//! has no inline error is a no-op; both go through the host so the page
//! never ends up with duplicate nodes.

use crate::host::Host;
use crate::rules::FieldType;

/// The control a keyboard user lands on for a logical field. Composite
/// widgets focus their visible part, not the hidden portal control.
pub fn focusable_control(host: &dyn Host, base: &str, field_type: FieldType) -> String {
    let candidates: Vec<String> = match field_type {
        FieldType::Date => vec![
            format!("{base}_datepicker_description"),
            format!("{base}_datepicker"),
            base.to_string(),
        ],
        FieldType::Time => vec![
            format!("{base}_timepicker_description"),
            format!("{base}_timepicker"),
            base.to_string(),
        ],
        FieldType::Lookup => vec![format!("{base}_name"), base.to_string()],
        FieldType::File => vec![format!("{base}_input_file"), base.to_string()],
        FieldType::Text => vec![base.to_string()],
    };
    candidates
        .into_iter()
        .find(|c| host.control_exists(c))
        .unwrap_or_else(|| base.to_string())
}

/// Infers a field's widget type from its partner controls when no record
/// carries an explicit one.
pub fn resolve_type(host: &dyn Host, base: &str, declared: FieldType) -> FieldType {
    if declared != FieldType::Text {
        return declared;
    }
    if host.control_exists(&format!("{base}_datepicker_description"))
        || host.control_exists(&format!("{base}_datepicker"))
    {
        FieldType::Date
    } else if host.control_exists(&format!("{base}_timepicker_description"))
        || host.control_exists(&format!("{base}_timepicker"))
    {
        FieldType::Time
    } else if host.control_exists(&format!("{base}_input_file")) {
        FieldType::File
    } else if host.is_select(base) {
        FieldType::Lookup
    } else {
        FieldType::Text
    }
}

pub fn paint(host: &mut dyn Host, base: &str, field_type: FieldType, message: &str) {
    let control = focusable_control(&*host, base, field_type);
    host.set_inline_error(base, &control, message);
}

pub fn clear(host: &mut dyn Host, base: &str, field_type: FieldType) {
    let control = focusable_control(&*host, base, field_type);
    host.clear_inline_error(base, &control);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PageModel;

    #[test]
    fn date_fields_focus_the_visible_picker_input() {
        let mut page = PageModel::new("en");
        page.add_date_field("start", "Start date");
        assert_eq!(
            focusable_control(&page, "start", FieldType::Date),
            "start_datepicker_description"
        );
        // Without picker partners the base control is the fallback.
        assert_eq!(focusable_control(&page, "other", FieldType::Date), "other");
    }

    #[test]
    fn type_resolution_probes_partner_controls() {
        let mut page = PageModel::new("en");
        page.add_date_field("start", "Start date");
        page.add_file_field("doc", "Document");
        page.add_select_field("province", "Province");
        assert_eq!(resolve_type(&page, "start", FieldType::Text), FieldType::Date);
        assert_eq!(resolve_type(&page, "doc", FieldType::Text), FieldType::File);
        assert_eq!(resolve_type(&page, "province", FieldType::Text), FieldType::Lookup);
        // A declared type wins over probing.
        assert_eq!(resolve_type(&page, "start", FieldType::Lookup), FieldType::Lookup);
    }

    #[test]
    fn painting_targets_the_focusable_control() {
        let mut page = PageModel::new("en");
        page.add_file_field("doc", "Document");
        paint(&mut page, "doc", FieldType::File, "Error 1: A file must be attached");
        assert!(page.has_inline_error("doc"));
        assert_eq!(page.attr("doc_input_file", "aria-invalid").as_deref(), Some("true"));
        clear(&mut page, "doc", FieldType::File);
        assert!(!page.has_inline_error("doc"));
    }
}
