//! Field rule evaluators.
//!
//! Every evaluator is a pure function from a field's current state (read
//! through the host) to a verdict. Rule functions never touch presentation;
//! the engine owns repainting and summary refresh.
//!
//! - `file`: the rich file check (required / zero-byte / max size /
//!   extension allow-list) and the central stored-file query.
//! - `required`: generic required-state check for non-file controls.
//! - `phone`: strict phone character filtering and blur normalization.
//! - `int_range`: digit restriction and min/max clamping.
//! - `datetime`: bilingual time normalization and composite date+time join.

pub mod datetime;
pub mod file;
pub mod int_range;
pub mod phone;
pub mod required;

use serde::Deserialize;

use crate::errors::RuleFailure;
use crate::host::Host;
use crate::locale::Locale;

/// Logical type of a field, driving target expansion and focus resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum FieldType {
    #[default]
    Text,
    Date,
    Time,
    Lookup,
    File,
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        FieldType::parse(&s)
    }
}

impl FieldType {
    /// Maps the host runtime's loose type strings (`"select-one"`, `"email"`,
    /// `"number"`, …) onto a logical type; anything unrecognized is text.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "date" => FieldType::Date,
            "time" => FieldType::Time,
            "lookup" | "select" | "select-one" => FieldType::Lookup,
            "file" => FieldType::File,
            _ => FieldType::Text,
        }
    }
}

/// Read-only view of one field handed to rule functions.
pub struct FieldContext<'a> {
    pub field_id: &'a str,
    pub field_type: FieldType,
    pub locale: Locale,
    pub host: &'a dyn Host,
}

impl<'a> FieldContext<'a> {
    /// The field's current value, empty when the control is absent.
    pub fn value(&self) -> String {
        self.host.value(self.field_id).unwrap_or_default()
    }
}

/// Outcome of one rule evaluation: pass, or a classified failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    pub failure: Option<RuleFailure>,
}

impl Verdict {
    pub fn pass() -> Self {
        Verdict { valid: true, failure: None }
    }

    pub fn fail(failure: RuleFailure) -> Self {
        Verdict { valid: false, failure: Some(failure) }
    }
}

/// Externally supplied rule function. Failure of the function itself (`Err`)
/// is caught at the invocation site and treated as "no verdict change".
pub type RuleFn = fn(&FieldContext) -> Result<bool, String>;

/// One externally supplied rule plus its bilingual messages. Stored in the
/// engine's lookup table, referenced from records by id.
#[derive(Clone)]
pub struct CustomRule {
    pub evaluate: RuleFn,
    pub message_en: String,
    pub message_fr: String,
}

impl std::fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomRule")
            .field("message_en", &self.message_en)
            .field("message_fr", &self.message_fr)
            .finish_non_exhaustive()
    }
}
