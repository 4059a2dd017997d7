//! In-memory page model.
//!
//! A faithful-enough stand-in for a rendered form page: controls with
//! values, text, and attributes; labels; live regions; the validation
//! summary; and a log of announcements and synthetic events. The test
//! suites drive the engine against this model, and the CLI builds one
//! from a form definition.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::host::{Channel, FileSelection, Host, LabelParts, SubmitState, SummaryEntry};

#[derive(Debug, Default, Clone)]
struct Control {
    value: String,
    text: String,
    attrs: BTreeMap<String, String>,
    select: bool,
    disabled: bool,
}

#[derive(Debug, Clone)]
struct Label {
    raw: String,
    parts: Option<LabelParts>,
}

/// How the model answers [`Host::evaluate_native`] for a native validator.
#[derive(Debug, Clone)]
pub enum NativeCheck {
    /// Required-style: valid when the named control has a non-blank value.
    RequiredOf(String),
    /// Always returns the given verdict.
    Fixed(bool),
}

/// Snapshot of the rendered validation summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub heading: String,
    pub entries: Vec<SummaryEntry>,
}

#[derive(Debug)]
pub struct PageModel {
    lang: String,
    controls: BTreeMap<String, Control>,
    labels: HashMap<String, Label>,
    files: HashMap<String, FileSelection>,
    file_fields: BTreeSet<String>,
    radio_groups: HashMap<String, Vec<String>>,
    native_checks: HashMap<String, NativeCheck>,
    inline_errors: BTreeMap<String, (String, String)>,
    summary: Option<SummaryView>,
    native_summary_announcement: String,
    live_regions: HashMap<Channel, String>,
    announcements: Vec<(Channel, String)>,
    page_valid: bool,
    block_submit: bool,
    submit_state: SubmitState,
    submit_label: String,
    dispatched_changes: Vec<String>,
    listeners: BTreeSet<String>,
    hidden_delete_buttons: BTreeSet<String>,
}

impl PageModel {
    pub fn new(lang: &str) -> Self {
        PageModel {
            lang: lang.to_string(),
            controls: BTreeMap::new(),
            labels: HashMap::new(),
            files: HashMap::new(),
            file_fields: BTreeSet::new(),
            radio_groups: HashMap::new(),
            native_checks: HashMap::new(),
            inline_errors: BTreeMap::new(),
            summary: None,
            native_summary_announcement: String::new(),
            live_regions: HashMap::new(),
            announcements: Vec::new(),
            page_valid: true,
            block_submit: false,
            submit_state: SubmitState::Default,
            submit_label: String::new(),
            dispatched_changes: Vec::new(),
            listeners: BTreeSet::new(),
            hidden_delete_buttons: BTreeSet::new(),
        }
    }

    // ----- construction helpers -----

    pub fn add_control(&mut self, id: &str, value: &str) {
        self.controls.insert(
            id.to_string(),
            Control { value: value.to_string(), ..Control::default() },
        );
    }

    pub fn add_text_field(&mut self, id: &str, label: &str) {
        self.add_control(id, "");
        self.set_label(id, label);
    }

    pub fn add_select_field(&mut self, id: &str, label: &str) {
        self.add_control(id, "");
        if let Some(c) = self.controls.get_mut(id) {
            c.select = true;
        }
        self.set_label(id, label);
    }

    pub fn add_file_field(&mut self, id: &str, label: &str) {
        self.add_control(&format!("{id}_input_file"), "");
        // The visible filename span next to the input.
        self.add_control(&format!("{id}_file_name"), "");
        self.set_label(id, label);
        self.file_fields.insert(id.to_string());
    }

    pub fn add_date_field(&mut self, id: &str, label: &str) {
        self.add_control(id, "");
        self.add_control(&format!("{id}_datepicker_description"), "");
        self.set_label(id, label);
    }

    pub fn add_radio_group(&mut self, group_id: &str, members: &[&str]) {
        for m in members {
            self.add_control(m, "");
        }
        self.radio_groups
            .insert(group_id.to_string(), members.iter().map(|m| m.to_string()).collect());
    }

    pub fn set_label(&mut self, field_id: &str, text: &str) {
        self.labels
            .insert(field_id.to_string(), Label { raw: text.to_string(), parts: None });
    }

    pub fn set_value(&mut self, control_id: &str, value: &str) {
        if let Some(c) = self.controls.get_mut(control_id) {
            c.value = value.to_string();
        }
    }

    pub fn set_attr(&mut self, control_id: &str, name: &str, value: &str) {
        if let Some(c) = self.controls.get_mut(control_id) {
            c.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, control_id: &str, name: &str) {
        if let Some(c) = self.controls.get_mut(control_id) {
            c.attrs.remove(name);
        }
    }

    pub fn set_text(&mut self, control_id: &str, text: &str) {
        if let Some(c) = self.controls.get_mut(control_id) {
            c.text = text.to_string();
        }
    }

    pub fn set_select(&mut self, control_id: &str, select: bool) {
        if let Some(c) = self.controls.get_mut(control_id) {
            c.select = select;
        }
    }

    pub fn set_disabled(&mut self, control_id: &str, disabled: bool) {
        if let Some(c) = self.controls.get_mut(control_id) {
            c.disabled = disabled;
        }
    }

    pub fn set_file(&mut self, field_id: &str, file: FileSelection) {
        self.files.insert(field_id.to_string(), file);
    }

    pub fn clear_file(&mut self, field_id: &str) {
        self.files.remove(field_id);
    }

    pub fn set_native_check(&mut self, native_id: &str, check: NativeCheck) {
        self.native_checks.insert(native_id.to_string(), check);
    }

    // ----- inspection for tests and the CLI -----

    pub fn inline_error(&self, field_id: &str) -> Option<&str> {
        self.inline_errors.get(field_id).map(|(_, msg)| msg.as_str())
    }

    pub fn inline_error_count(&self) -> usize {
        self.inline_errors.len()
    }

    pub fn summary(&self) -> Option<&SummaryView> {
        self.summary.as_ref()
    }

    pub fn live_region(&self, channel: Channel) -> &str {
        self.live_regions.get(&channel).map(String::as_str).unwrap_or("")
    }

    pub fn announcements(&self) -> &[(Channel, String)] {
        &self.announcements
    }

    pub fn dispatched_changes(&self) -> &[String] {
        &self.dispatched_changes
    }

    pub fn page_valid(&self) -> bool {
        self.page_valid
    }

    pub fn submit_blocked(&self) -> bool {
        self.block_submit
    }

    pub fn submit_state(&self) -> SubmitState {
        self.submit_state
    }

    pub fn submit_label(&self) -> &str {
        &self.submit_label
    }

    pub fn has_listener(&self, control_id: &str) -> bool {
        self.listeners.contains(control_id)
    }

    pub fn delete_button_hidden(&self, field_id: &str) -> bool {
        self.hidden_delete_buttons.contains(field_id)
    }

    pub fn raw_label(&self, field_id: &str) -> Option<&str> {
        self.labels.get(field_id).map(|l| l.raw.as_str())
    }

    pub fn label_parts(&self, field_id: &str) -> Option<&LabelParts> {
        self.labels.get(field_id).and_then(|l| l.parts.as_ref())
    }
}

impl Host for PageModel {
    fn lang(&self) -> String {
        self.lang.clone()
    }

    fn control_exists(&self, control_id: &str) -> bool {
        self.controls.contains_key(control_id)
    }

    fn control_ids(&self) -> Vec<String> {
        self.controls.keys().cloned().collect()
    }

    fn value(&self, control_id: &str) -> Option<String> {
        self.controls.get(control_id).map(|c| c.value.clone())
    }

    fn text(&self, control_id: &str) -> Option<String> {
        self.controls.get(control_id).map(|c| c.text.clone())
    }

    fn attr(&self, control_id: &str, name: &str) -> Option<String> {
        self.controls.get(control_id).and_then(|c| c.attrs.get(name).cloned())
    }

    fn is_select(&self, control_id: &str) -> bool {
        self.controls.get(control_id).map(|c| c.select).unwrap_or(false)
    }

    fn is_disabled(&self, control_id: &str) -> bool {
        self.controls.get(control_id).map(|c| c.disabled).unwrap_or(false)
    }

    fn label_text(&self, field_id: &str) -> Option<String> {
        self.labels.get(field_id).map(|l| match &l.parts {
            Some(parts) => parts.name.clone(),
            None => l.raw.clone(),
        })
    }

    fn selected_file(&self, field_id: &str) -> Option<FileSelection> {
        self.files.get(field_id).cloned()
    }

    fn file_field_ids(&self) -> Vec<String> {
        self.file_fields.iter().cloned().collect()
    }

    fn radio_group(&self, group_id: &str) -> Vec<String> {
        self.radio_groups.get(group_id).cloned().unwrap_or_default()
    }

    fn evaluate_native(&mut self, native_id: &str) -> Option<bool> {
        match self.native_checks.get(native_id) {
            Some(NativeCheck::RequiredOf(control)) => {
                let value = self.value(control).unwrap_or_default();
                Some(!value.trim().is_empty())
            }
            Some(NativeCheck::Fixed(verdict)) => Some(*verdict),
            None => None,
        }
    }

    fn has_inline_error(&self, field_id: &str) -> bool {
        self.inline_errors.contains_key(field_id)
    }

    fn set_value(&mut self, control_id: &str, value: &str) {
        PageModel::set_value(self, control_id, value);
    }

    fn set_attr(&mut self, control_id: &str, name: &str, value: &str) {
        PageModel::set_attr(self, control_id, name, value);
    }

    fn remove_attr(&mut self, control_id: &str, name: &str) {
        PageModel::remove_attr(self, control_id, name);
    }

    fn set_label_parts(&mut self, field_id: &str, parts: LabelParts) {
        let entry = self
            .labels
            .entry(field_id.to_string())
            .or_insert_with(|| Label { raw: String::new(), parts: None });
        entry.raw = format!("{}{}", parts.name, parts.required_suffix);
        entry.parts = Some(parts);
    }

    fn clear_label_decoration(&mut self, field_id: &str) {
        if let Some(label) = self.labels.get_mut(field_id) {
            if let Some(parts) = label.parts.take() {
                label.raw = parts.name;
            }
        }
    }

    fn set_inline_error(&mut self, field_id: &str, control_id: &str, message: &str) {
        self.inline_errors
            .insert(field_id.to_string(), (control_id.to_string(), message.to_string()));
        if let Some(c) = self.controls.get_mut(control_id) {
            c.attrs.insert("aria-invalid".to_string(), "true".to_string());
        }
    }

    fn clear_inline_error(&mut self, field_id: &str, control_id: &str) {
        self.inline_errors.remove(field_id);
        if let Some(c) = self.controls.get_mut(control_id) {
            c.attrs.remove("aria-invalid");
        }
    }

    fn show_summary(&mut self, heading: &str, entries: &[SummaryEntry]) {
        self.summary =
            Some(SummaryView { heading: heading.to_string(), entries: entries.to_vec() });
    }

    fn hide_summary(&mut self) {
        self.summary = None;
    }

    fn clear_native_summary_announcement(&mut self) {
        self.native_summary_announcement.clear();
    }

    fn announce(&mut self, channel: Channel, text: &str) {
        self.live_regions.insert(channel, text.to_string());
        self.announcements.push((channel, text.to_string()));
    }

    fn set_page_valid(&mut self, valid: bool) {
        self.page_valid = valid;
    }

    fn set_block_submit(&mut self, block: bool) {
        self.block_submit = block;
    }

    fn set_submit_control(&mut self, state: SubmitState, label: &str) {
        self.submit_state = state;
        self.submit_label = label.to_string();
    }

    fn dispatch_change(&mut self, control_id: &str) {
        self.dispatched_changes.push(control_id.to_string());
    }

    fn attach_change_listener(&mut self, control_id: &str) {
        self.listeners.insert(control_id.to_string());
    }

    fn detach_change_listeners(&mut self, control_id: &str) {
        self.listeners.remove(control_id);
    }

    fn set_delete_button_visible(&mut self, field_id: &str, visible: bool) {
        if visible {
            self.hidden_delete_buttons.remove(field_id);
        } else {
            self.hidden_delete_buttons.insert(field_id.to_string());
        }
    }

    fn clear_file_name_label(&mut self, field_id: &str) {
        let name_id = format!("{field_id}_file_name");
        if let Some(c) = self.controls.get_mut(&name_id) {
            c.text.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_text_prefers_decorated_name() {
        let mut page = PageModel::new("en");
        page.add_text_field("email", "Email address (required)");
        page.set_label_parts(
            "email",
            LabelParts {
                name: "Email address".to_string(),
                required_suffix: " (required)".to_string(),
                sr_suffix: "required".to_string(),
            },
        );
        assert_eq!(page.label_text("email").as_deref(), Some("Email address"));
        page.clear_label_decoration("email");
        assert_eq!(page.raw_label("email"), Some("Email address"));
    }

    #[test]
    fn native_required_check_follows_control_value() {
        let mut page = PageModel::new("en");
        page.add_control("city", "");
        page.set_native_check(
            "RequiredFieldValidator3",
            NativeCheck::RequiredOf("city".to_string()),
        );
        assert_eq!(page.evaluate_native("RequiredFieldValidator3"), Some(false));
        Host::set_value(&mut page, "city", "Ottawa");
        assert_eq!(page.evaluate_native("RequiredFieldValidator3"), Some(true));
        assert_eq!(page.evaluate_native("RequiredFieldValidator9"), None);
    }

    #[test]
    fn inline_error_marks_control_invalid() {
        let mut page = PageModel::new("en");
        page.add_text_field("phone", "Telephone");
        page.set_inline_error("phone", "phone", "Error 1: This field is required");
        assert!(page.has_inline_error("phone"));
        assert_eq!(page.attr("phone", "aria-invalid").as_deref(), Some("true"));
        page.clear_inline_error("phone", "phone");
        assert!(!page.has_inline_error("phone"));
        assert_eq!(page.attr("phone", "aria-invalid"), None);
    }
}
