//! Error taxonomy for rule verdicts and crate-level failures.
//!
//! Two distinct kinds of "error" live here and must not be conflated:
//!
//! - [`RuleFailure`] classifies *why a field is invalid*. It is carried on
//!   validator records and summary entries and drives message resolution.
//!   A rule failure is normal data flow, not a Rust error.
//! - [`FormguardError`] is the crate-level error type for genuine failures:
//!   malformed declarative configuration, unknown fields referenced by the
//!   CLI, I/O. These propagate with `?` in the usual way.
//!
//! A custom rule function that itself fails (the `evaluationException` case)
//! is caught at the invocation site and treated as "no verdict change" for
//! that record. It never aborts evaluation of sibling validators.

use miette::Diagnostic;
use thiserror::Error;

/// Why a validator record currently reports invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleFailure {
    /// No value present and no pre-existing stored value.
    Required,
    /// A selected file with a size of zero bytes.
    ZeroByte,
    /// A selected file larger than the configured maximum.
    MaxSize,
    /// A filename with no extension, or one outside the allow-list.
    FileTypes,
    /// An externally supplied rule function returned `false`.
    CustomRuleFailure,
    /// A rule function itself failed; previous validity was preserved.
    EvaluationException,
}

impl RuleFailure {
    /// The message-table key this failure resolves through.
    pub fn key(self) -> &'static str {
        match self {
            RuleFailure::Required => "required",
            RuleFailure::ZeroByte => "zeroByte",
            RuleFailure::MaxSize => "maxSize",
            RuleFailure::FileTypes => "fileTypes",
            RuleFailure::CustomRuleFailure => "customRuleFailure",
            RuleFailure::EvaluationException => "evaluationException",
        }
    }
}

impl std::fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Crate-level failures (configuration, CLI, I/O).
#[derive(Debug, Error, Diagnostic)]
pub enum FormguardError {
    #[error("failed to read {path}")]
    #[diagnostic(help("check that the file exists and is readable"))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse form definition {path}")]
    #[diagnostic(help("the file must be a JSON or YAML form definition"))]
    ParseForm {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("could not parse field values {path}")]
    #[diagnostic(help("the file must map field ids to string values"))]
    ParseValues {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("value supplied for unknown field `{field}`")]
    #[diagnostic(help("every key in the values file must match a field id in the form definition"))]
    UnknownField { field: String },
}

pub type Result<T> = std::result::Result<T, FormguardError>;
