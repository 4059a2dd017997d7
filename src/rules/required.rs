//! Required-state check.

use crate::errors::RuleFailure;
use crate::rules::{FieldContext, FieldType, Verdict};

/// Fails when the field carries no value and no previously persisted
/// content satisfies it. For file fields the persisted-content question is
/// answered by the central stored-file query.
pub fn evaluate(ctx: &FieldContext) -> Verdict {
    if !ctx.value().trim().is_empty() {
        return Verdict::pass();
    }
    if ctx.field_type == FieldType::File
        && crate::rules::file::stored_file_present(ctx.host, ctx.field_id)
    {
        return Verdict::pass();
    }
    Verdict::fail(RuleFailure::Required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PageModel;
    use crate::locale::Locale;

    #[test]
    fn empty_value_fails_required() {
        let mut page = PageModel::new("en");
        page.add_text_field("name", "Full name");
        let ctx = FieldContext {
            field_id: "name",
            field_type: FieldType::Text,
            locale: Locale::En,
            host: &page,
        };
        assert_eq!(evaluate(&ctx).failure, Some(RuleFailure::Required));
        page.set_value("name", "Ada");
        let ctx = FieldContext {
            field_id: "name",
            field_type: FieldType::Text,
            locale: Locale::En,
            host: &page,
        };
        assert!(evaluate(&ctx).valid);
    }

    #[test]
    fn stored_server_file_satisfies_required_file() {
        let mut page = PageModel::new("en");
        page.add_file_field("doc", "Document");
        page.add_control("doc_hidden_filename", "kept.pdf");
        let ctx = FieldContext {
            field_id: "doc",
            field_type: FieldType::File,
            locale: Locale::En,
            host: &page,
        };
        assert!(evaluate(&ctx).valid);
    }
}
