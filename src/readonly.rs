//! Read-only enablers.
//!
//! Disabled controls are invisible to screen readers and excluded from
//! postback, so fields that must stay visible-but-unchangeable are kept
//! enabled and guarded instead: they stay in the tab order, expose
//! `aria-readonly`, and any value change is reverted on the spot.

use std::collections::HashMap;

use crate::host::Host;

/// Pinned controls and their frozen values. Owned by the engine; the
/// engine consults [`Guards::intercept`] before any other change handling.
#[derive(Debug, Default)]
pub struct Guards {
    pinned: HashMap<String, String>,
}

impl Guards {
    pub fn new() -> Self {
        Self::default()
    }

    fn pin(&mut self, host: &dyn Host, control_id: &str) {
        let value = host.value(control_id).unwrap_or_default();
        self.pinned.insert(control_id.to_string(), value);
    }

    pub fn is_guarded(&self, control_id: &str) -> bool {
        self.pinned.contains_key(control_id)
    }

    /// Reverts a guarded control to its pinned value. Returns true when the
    /// control is guarded, in which case no further change handling runs.
    pub fn intercept(&self, host: &mut dyn Host, control_id: &str) -> bool {
        let Some(pinned) = self.pinned.get(control_id) else {
            return false;
        };
        if host.value(control_id).as_deref() != Some(pinned) {
            host.set_value(control_id, pinned);
        }
        true
    }

    /// Keeps a select focusable and announced but freezes its selection.
    pub fn readonly_select(&mut self, host: &mut dyn Host, control_id: &str) {
        if !host.control_exists(control_id) || self.is_guarded(control_id) {
            return;
        }
        host.set_attr(control_id, "aria-readonly", "true");
        host.set_attr(control_id, "tabindex", "0");
        self.pin(&*host, control_id);
    }

    /// Read-only text input that stays in the tab order.
    pub fn tabbable_readonly(&mut self, host: &mut dyn Host, control_id: &str) {
        if !host.control_exists(control_id) || self.is_guarded(control_id) {
            return;
        }
        host.set_attr(control_id, "readonly", "readonly");
        host.set_attr(control_id, "aria-readonly", "true");
        host.set_attr(control_id, "tabindex", "0");
        self.pin(&*host, control_id);
    }

    /// Freezes a radio group. Only the checked member stays tabbable, so
    /// arrow-key navigation cannot silently move the selection.
    pub fn readonly_radio_group(&mut self, host: &mut dyn Host, group_id: &str) {
        for member in host.radio_group(group_id) {
            if self.is_guarded(&member) {
                continue;
            }
            let checked = host.attr(&member, "checked").is_some();
            host.set_attr(&member, "aria-readonly", "true");
            host.set_attr(&member, "tabindex", if checked { "0" } else { "-1" });
            self.pin(&*host, &member);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PageModel;

    #[test]
    fn guarded_control_reverts_to_pinned_value() {
        let mut page = PageModel::new("en");
        page.add_text_field("sin", "SIN");
        page.set_value("sin", "123456789");
        let mut guards = Guards::new();
        guards.tabbable_readonly(&mut page, "sin");

        page.set_value("sin", "tampered");
        assert!(guards.intercept(&mut page, "sin"));
        assert_eq!(page.value("sin").as_deref(), Some("123456789"));
        assert!(!guards.intercept(&mut page, "other"));
    }

    #[test]
    fn radio_group_tab_order_follows_checked_member() {
        let mut page = PageModel::new("en");
        page.add_radio_group("lang_pref", &["lang_pref_0", "lang_pref_1"]);
        page.set_attr("lang_pref_1", "checked", "checked");
        let mut guards = Guards::new();
        guards.readonly_radio_group(&mut page, "lang_pref");

        assert_eq!(page.attr("lang_pref_0", "tabindex").as_deref(), Some("-1"));
        assert_eq!(page.attr("lang_pref_1", "tabindex").as_deref(), Some("0"));
        assert!(guards.is_guarded("lang_pref_0"));
    }
}
