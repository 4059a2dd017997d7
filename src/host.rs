//! The seam between the engine and the page.
//!
//! The form runtime, the document, and the assistive-technology live
//! regions are external collaborators. Everything the engine needs from
//! them goes through the [`Host`] trait: read-only queries about controls
//! and native validators, and presentation operations (inline errors,
//! summary, announcements, attribute edits). Presentation operations must
//! be tolerant: a host that cannot perform one simply ignores it, and the
//! validity flags stay correct regardless.
//!
//! [`PageModel`] is the crate's complete in-memory implementation, used by
//! the test suites and the `formcheck` CLI.

mod page;

pub use page::{NativeCheck, PageModel, SummaryView};

use crate::errors::RuleFailure;
use crate::rules::FieldType;

/// A locally selected file: name plus size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub name: String,
    pub size: u64,
}

impl FileSelection {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        FileSelection { name: name.into(), size }
    }
}

/// Assistive-technology announcement channels. Each is an independent live
/// region; the engine decides what goes where and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Polite region kept in sync with the summary heading on submit passes.
    PoliteSummary,
    /// Assertive region for the rebuilt summary heading.
    AssertiveSummary,
    /// Assertive region mirroring the submit control's state.
    SubmitControl,
}

/// Submit-control visual state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    /// Disabled and marked busy while a validation pass runs.
    Processing,
    /// Enabled, default presentation.
    Default,
}

/// The pieces a decorated required label is rebuilt from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelParts {
    /// The field name with required phrases stripped.
    pub name: String,
    /// Visible required suffix, hidden from screen readers.
    pub required_suffix: String,
    /// Screen-reader-only required suffix.
    pub sr_suffix: String,
}

/// One entry of the rebuilt validation summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub number: usize,
    pub field_id: String,
    /// Link target: the field's label element.
    pub anchor: String,
    pub message: String,
    pub aria_label: String,
    pub kind: Option<RuleFailure>,
    pub field_type: FieldType,
}

/// Host-page interface consumed by the engine.
pub trait Host {
    // ----- queries -----

    /// The page's declared language attribute (e.g. `"en-CA"`).
    fn lang(&self) -> String;
    fn control_exists(&self, control_id: &str) -> bool;
    /// All control ids, for page-wide sweeps (tooltip stripping, pattern
    /// normalization).
    fn control_ids(&self) -> Vec<String>;
    fn value(&self, control_id: &str) -> Option<String>;
    /// Text content of a non-input element (filename spans and the like).
    fn text(&self, control_id: &str) -> Option<String>;
    fn attr(&self, control_id: &str, name: &str) -> Option<String>;
    fn is_select(&self, control_id: &str) -> bool;
    fn is_disabled(&self, control_id: &str) -> bool;
    /// Current label text for a field; prefers the clean field-name part
    /// when the label has been decorated.
    fn label_text(&self, field_id: &str) -> Option<String>;
    fn selected_file(&self, field_id: &str) -> Option<FileSelection>;
    /// Base ids of every file field in the form.
    fn file_field_ids(&self) -> Vec<String>;
    /// Member control ids of a radio group, in document order.
    fn radio_group(&self, group_id: &str) -> Vec<String>;
    /// Invokes the host runtime's own evaluation primitive for one of its
    /// native validators. `None` when the runtime cannot evaluate it; the
    /// previous verdict is then preserved.
    fn evaluate_native(&mut self, native_id: &str) -> Option<bool>;
    fn has_inline_error(&self, field_id: &str) -> bool;

    // ----- mutations -----

    fn set_value(&mut self, control_id: &str, value: &str);
    fn set_attr(&mut self, control_id: &str, name: &str, value: &str);
    fn remove_attr(&mut self, control_id: &str, name: &str);
    /// Replaces a plain label with the decorated required structure.
    fn set_label_parts(&mut self, field_id: &str, parts: LabelParts);
    /// Restores a decorated label back to plain text.
    fn clear_label_decoration(&mut self, field_id: &str);
    /// Paints the single inline error for a field: error frame and
    /// `aria-invalid` on the focusable control, one message node under the
    /// label. Must be idempotent.
    fn set_inline_error(&mut self, field_id: &str, control_id: &str, message: &str);
    fn clear_inline_error(&mut self, field_id: &str, control_id: &str);
    fn show_summary(&mut self, heading: &str, entries: &[SummaryEntry]);
    fn hide_summary(&mut self);
    /// Clears the host runtime's own hidden summary announcement text.
    fn clear_native_summary_announcement(&mut self);
    fn announce(&mut self, channel: Channel, text: &str);
    fn set_page_valid(&mut self, valid: bool);
    fn set_block_submit(&mut self, block: bool);
    fn set_submit_control(&mut self, state: SubmitState, label: &str);
    /// Dispatches a synthetic bubbling change on a control so the host
    /// runtime's own bookkeeping stays in sync.
    fn dispatch_change(&mut self, control_id: &str);
    fn attach_change_listener(&mut self, control_id: &str);
    fn detach_change_listeners(&mut self, control_id: &str);
    fn set_delete_button_visible(&mut self, field_id: &str, visible: bool);
    /// Clears a stale visible filename label after a server-side delete.
    fn clear_file_name_label(&mut self, field_id: &str);
}
