pub use crate::errors::{FormguardError, Result, RuleFailure};

pub mod cli;
pub mod engine;
pub mod errors;
pub mod host;
pub mod locale;
pub mod messages;
pub mod readonly;
pub mod registry;
pub mod rules;

pub use crate::engine::{Engine, FieldEvent, FieldRules};
pub use crate::host::{Channel, FileSelection, Host, PageModel, SubmitState};
pub use crate::locale::Locale;
pub use crate::registry::{ValidatorKind, ValidatorRegistry};
pub use crate::rules::{CustomRule, FieldType};
