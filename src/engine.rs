//! The re-validation coordinator.
//!
//! One engine instance owns the registry, the custom-rule lookup table,
//! the deferred-work queue, and the announcement choreography. Every field
//! event funnels through [`Engine::notify`]; every validity change funnels
//! through one global pass that repaints inline errors, refreshes the
//! summary, and updates the page flags. The engine stays quiet until the
//! first submit attempt: before that, no error is ever painted, no region
//! ever speaks.
//!
//! The engine never blocks: all delays live in the [`schedule`] queue and
//! run when the host drives [`Engine::advance`].

pub mod announce;
pub mod inline;
pub mod schedule;
pub mod summary;

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::errors::RuleFailure;
use crate::host::{Channel, Host, LabelParts};
use crate::locale::Locale;
use crate::messages;
use crate::readonly::Guards;
use crate::registry::{self, RecordId, RuleId, ValidatorKind, ValidatorRegistry};
use crate::rules::{self, CustomRule, FieldContext, FieldType};

use self::announce::Announcer;
use self::schedule::{PassContext, Scheduler, Task};

/// Delay between inline repaint and the settled summary render, absorbing
/// the churn of widgets that re-render their own DOM after a change.
const SETTLE_RENDER_MS: u64 = 250;

/// Window after a field-level event during which the summary must not
/// steal focus, even if a submit pass lands inside it.
const FOCUS_SUPPRESS_MS: u64 = 1200;

/// What happened on a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    /// A keystroke; runs input filters only, never validation.
    Input,
    Change,
    Blur,
    /// The control's own native invalid event.
    Invalid,
}

/// Declarative registration for one field: its required flag plus any
/// externally supplied rules.
pub struct FieldRules {
    pub id: String,
    /// Explicit type; probed from partner controls when absent.
    pub field_type: Option<FieldType>,
    pub required: bool,
    pub rules: Vec<CustomRule>,
}

impl FieldRules {
    pub fn new(id: impl Into<String>) -> Self {
        FieldRules { id: id.into(), field_type: None, required: false, rules: Vec::new() }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn typed(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn rule(mut self, rule: CustomRule) -> Self {
        self.rules.push(rule);
        self
    }
}

#[derive(Debug, Clone)]
enum InputFilter {
    Phone,
    IntRange(rules::int_range::IntRange),
}

#[derive(Debug, Clone)]
struct PortalJoin {
    date_control: String,
    time_control: String,
    portal: String,
}

fn required_rule(ctx: &FieldContext) -> Result<bool, String> {
    Ok(rules::required::evaluate(ctx).valid)
}

pub struct Engine {
    locale: Locale,
    registry: ValidatorRegistry,
    custom_rules: HashMap<RuleId, CustomRule>,
    required_rules: HashSet<RuleId>,
    next_rule_id: u64,
    sched: Scheduler,
    announcer: Announcer,
    /// False until the first submit attempt; field events stay silent.
    active: bool,
    live_handlers_attached: bool,
    /// Per-field reentrancy guard: the synthetic events a repaint fires
    /// must not re-enter the same field's pipeline.
    busy_fields: HashSet<String>,
    /// Global pass guard; released at the end of the current tick so
    /// same-tick refresh requests coalesce into one pass.
    global_busy: bool,
    /// Required-decoration patch counts per field.
    decorated: HashMap<String, u32>,
    filters: HashMap<String, InputFilter>,
    portal_joins: Vec<PortalJoin>,
    readonly: Guards,
    /// Page-wide max upload size override, below per-field attributes.
    default_max_file_bytes: Option<u64>,
    suppress_focus_until: u64,
    native_announcement_cleared: bool,
}

impl Engine {
    pub fn new(locale: Locale) -> Self {
        Engine {
            locale,
            registry: ValidatorRegistry::new(),
            custom_rules: HashMap::new(),
            required_rules: HashSet::new(),
            next_rule_id: 0,
            sched: Scheduler::new(),
            announcer: Announcer::new(),
            active: false,
            live_handlers_attached: false,
            busy_fields: HashSet::new(),
            global_busy: false,
            decorated: HashMap::new(),
            filters: HashMap::new(),
            portal_joins: Vec::new(),
            readonly: Guards::new(),
            default_max_file_bytes: None,
            suppress_focus_until: 0,
            native_announcement_cleared: false,
        }
    }

    /// Builds an engine whose locale follows the page's `lang` attribute.
    pub fn for_page(host: &dyn Host) -> Self {
        Engine::new(Locale::from_lang_attr(&host.lang()))
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn now(&self) -> u64 {
        self.sched.now()
    }

    /// Whether the summary may take focus right now. Focus is suppressed
    /// for a short window after field-level events so a change-triggered
    /// refresh never yanks the user away from the control they are editing.
    pub fn summary_focus_allowed(&self) -> bool {
        self.sched.now() >= self.suppress_focus_until
    }

    pub fn set_default_max_file_bytes(&mut self, max: Option<u64>) {
        self.default_max_file_bytes = max;
    }

    // ----- registration -----

    /// Registers fields and their rules. Required fields get the built-in
    /// required rule first, then the supplied rules in order, so the
    /// required wording wins the summary slot when both fail.
    pub fn add_validators(&mut self, host: &mut dyn Host, fields: Vec<FieldRules>) {
        for entry in fields {
            let declared = entry.field_type.unwrap_or_else(|| {
                FieldType::parse(&host.attr(&entry.id, "type").unwrap_or_default())
            });
            let field_type = inline::resolve_type(&*host, &entry.id, declared);

            if entry.required {
                self.decorate_required(host, &entry.id);
                let label = host.label_text(&entry.id);
                let text = messages::required_fallback(self.locale, label.as_deref());
                let rule = CustomRule {
                    evaluate: required_rule,
                    message_en: text.clone(),
                    message_fr: text.clone(),
                };
                let rule_id = self.intern_rule(rule);
                self.required_rules.insert(rule_id);
                self.registry.register(
                    &entry.id,
                    field_type,
                    ValidatorKind::Custom(rule_id),
                    messages::anchor_markup(&entry.id, &text),
                );
            }
            for rule in entry.rules {
                let text = self.locale.pick(&rule.message_en, &rule.message_fr).to_string();
                let rule_id = self.intern_rule(rule);
                self.registry.register(
                    &entry.id,
                    field_type,
                    ValidatorKind::Custom(rule_id),
                    messages::anchor_markup(&entry.id, &text),
                );
            }
            if self.live_handlers_attached {
                let control = inline::focusable_control(&*host, &entry.id, field_type);
                host.attach_change_listener(&control);
            }
        }
    }

    /// Removes every custom rule for a field, leaving platform-native
    /// records alone. Clears the field's inline error and, when the last
    /// rule goes, its required decoration.
    pub fn remove_validators(&mut self, host: &mut dyn Host, field_id: &str) {
        let base = registry::normalize_base(field_id);
        let field_type = self.resolved_type(&*host, &base);
        inline::clear(host, &base, field_type);

        let removed = self.registry.unregister_custom(field_id);
        for rec in &removed {
            if let ValidatorKind::Custom(rule_id) = rec.kind {
                self.custom_rules.remove(&rule_id);
                self.required_rules.remove(&rule_id);
            }
        }
        if !removed.is_empty() {
            let control = inline::focusable_control(&*host, &base, field_type);
            host.detach_change_listeners(&control);
        }
        if !self.registry.has_custom(field_id) {
            self.remove_required_decoration(host, field_id);
        }
    }

    /// Adopts one of the host runtime's own validator objects so it is
    /// evaluated, deduplicated, and summarized alongside everything else.
    pub fn adopt_native_validator(
        &mut self,
        field_id: &str,
        native_id: &str,
        error_message: &str,
        field_type: FieldType,
    ) -> Option<RecordId> {
        self.registry.adopt_native(
            field_id,
            native_id,
            error_message.to_string(),
            field_type,
        )
    }

    fn intern_rule(&mut self, rule: CustomRule) -> RuleId {
        let rule_id = RuleId(self.next_rule_id);
        self.next_rule_id += 1;
        self.custom_rules.insert(rule_id, rule);
        rule_id
    }

    // ----- file bridge -----

    /// Attaches the rich file check to one field. Idempotent: a field
    /// carries at most one bridge record.
    pub fn enable_file_bridge(&mut self, host: &mut dyn Host, field_id: &str) {
        if self.registry.has_file_bridge(field_id) {
            return;
        }
        self.registry.register(
            field_id,
            FieldType::File,
            ValidatorKind::FileBridge,
            String::new(),
        );
        let input = rules::file::input_control(&*host, field_id);
        host.attach_change_listener(&input);
        self.sync_delete_button(host, field_id);
    }

    /// Attaches the file bridge to every file field in the form.
    pub fn enable_file_bridge_for_form(&mut self, host: &mut dyn Host) {
        for field in host.file_field_ids() {
            self.enable_file_bridge(host, &field);
        }
    }

    pub fn disable_file_bridge(&mut self, host: &mut dyn Host, field_id: &str) {
        inline::clear(host, field_id, FieldType::File);
        self.registry.remove_file_bridge(field_id);
        let input = rules::file::input_control(&*host, field_id);
        host.detach_change_listeners(&input);
    }

    /// Whether a previously stored server-side file satisfies the field.
    pub fn has_stored_file(&self, host: &dyn Host, field_id: &str) -> bool {
        rules::file::stored_file_present(host, field_id)
    }

    /// Aligns the delete button and visible filename with the stored-file
    /// state: no stored file, no delete button, no stale label.
    pub fn sync_delete_button(&self, host: &mut dyn Host, field_id: &str) {
        let present = rules::file::stored_file_present(&*host, field_id);
        host.set_delete_button_visible(field_id, present);
        if !present {
            host.clear_file_name_label(field_id);
        }
    }

    /// The host page's delete button was clicked; the stored-file markers
    /// have already been updated, so re-check the field outside the click's
    /// call stack.
    pub fn notify_file_delete_clicked(&mut self, field_id: &str) {
        self.sched.schedule(
            0,
            Task::RevalidateField {
                field_id: field_id.to_string(),
                field_type: FieldType::File,
            },
        );
    }

    // ----- input shaping -----

    /// Drops the host runtime's stock integer/range validators for fields
    /// whose input is already restricted at the keystroke level, keeping
    /// their required validators.
    pub fn suppress_stock_int_range(&mut self, base_ids: &[&str]) -> usize {
        self.registry.suppress_stock_int_range(base_ids)
    }

    /// Strict phone filtering: digits and `+()-` while typing, digits only
    /// after blur.
    pub fn enable_strict_phone_input(&mut self, host: &mut dyn Host, control_ids: &[&str]) {
        for id in control_ids {
            if !host.control_exists(id) {
                continue;
            }
            host.set_attr(id, "inputmode", "tel");
            host.set_attr(id, "pattern", rules::phone::PATTERN_ATTR);
            let value = host.value(id).unwrap_or_default();
            let clean = rules::phone::sanitize(&value);
            if clean != value {
                host.set_value(id, &clean);
            }
            self.filters.insert(id.to_string(), InputFilter::Phone);
        }
    }

    /// Rewrites legacy `pattern` attributes whose character class carries an
    /// escaped hyphen, which some browsers reject outright.
    pub fn normalize_phone_patterns(&self, host: &mut dyn Host) {
        for id in host.control_ids() {
            let Some(pattern) = host.attr(&id, "pattern") else {
                continue;
            };
            if pattern == r"[0-9()+\-]*" || pattern == "[0-9()+-]*" {
                host.set_attr(&id, "pattern", rules::phone::PATTERN_ATTR);
                host.set_attr(&id, "inputmode", "tel");
            }
        }
    }

    /// Digit-only input with min/max clamping on blur. Re-applying to the
    /// same control replaces the previous range.
    pub fn restrict_int_range(
        &mut self,
        host: &mut dyn Host,
        control_id: &str,
        range: rules::int_range::IntRange,
    ) {
        if !host.control_exists(control_id) {
            return;
        }
        host.set_attr(control_id, "inputmode", "numeric");
        host.set_attr(control_id, "pattern", "[0-9]*");
        host.set_attr(control_id, "autocomplete", "off");
        let value = host.value(control_id).unwrap_or_default();
        let clean = range.sanitize(&value);
        if clean != value {
            host.set_value(control_id, &clean);
        }
        self.filters.insert(control_id.to_string(), InputFilter::IntRange(range));
    }

    /// Keeps a hidden portal control in sync with a visible date and time
    /// pair. The portal only ever carries a fully normalized joined value.
    pub fn wire_portal_composite(
        &mut self,
        host: &mut dyn Host,
        date_control: &str,
        time_control: &str,
        portal: &str,
    ) {
        if self.portal_joins.iter().any(|j| j.portal == portal) {
            return;
        }
        let join = PortalJoin {
            date_control: date_control.to_string(),
            time_control: time_control.to_string(),
            portal: portal.to_string(),
        };
        recompute_join(host, &join);
        self.portal_joins.push(join);
    }

    /// Strips decorative tooltips, which screen readers announce over the
    /// label. A `data-keep-title` attribute opts a control out.
    pub fn strip_tooltips(&self, host: &mut dyn Host) {
        for id in host.control_ids() {
            if host.attr(&id, "title").is_some() && host.attr(&id, "data-keep-title").is_none() {
                host.remove_attr(&id, "title");
            }
        }
    }

    /// Gives the picker addon buttons an accessible name in the page's
    /// language, replacing the tooltip they shipped with.
    pub fn refresh_datetime_addon_labels(&self, host: &mut dyn Host) {
        for id in host.control_ids() {
            let label = if id.ends_with("_datepicker_addon") {
                self.locale.pick("Choose a date", "Choisir une date")
            } else if id.ends_with("_timepicker_addon") {
                self.locale.pick("Choose a time", "Choisir l'heure")
            } else {
                continue;
            };
            host.set_attr(&id, "aria-label", label);
            host.remove_attr(&id, "title");
        }
    }

    // ----- required decoration -----

    /// Rebuilds a field's label as name + visible required suffix, with a
    /// screen-reader-only variant, and sets the `required` attribute.
    /// Counted, so nested decorations unwind cleanly.
    pub fn decorate_required(&mut self, host: &mut dyn Host, field_id: &str) {
        let count = self.decorated.entry(field_id.to_string()).or_insert(0);
        if *count > 0 {
            *count += 1;
            return;
        }
        *count = 1;
        let raw = host.label_text(field_id).unwrap_or_default();
        let name = messages::strip_all_required_phrases(&raw);
        host.set_label_parts(
            field_id,
            LabelParts {
                name,
                required_suffix: self.locale.pick(" (required)", " (obligatoire)").to_string(),
                sr_suffix: self.locale.pick("required", "obligatoire").to_string(),
            },
        );
        host.set_attr(field_id, "required", "required");
        host.remove_attr(field_id, "title");
        host.remove_attr(field_id, "aria-label");
    }

    pub fn remove_required_decoration(&mut self, host: &mut dyn Host, field_id: &str) {
        match self.decorated.get_mut(field_id) {
            None => return,
            Some(count) if *count > 1 => {
                *count -= 1;
                return;
            }
            Some(_) => {}
        }
        self.decorated.remove(field_id);
        host.clear_label_decoration(field_id);
        host.remove_attr(field_id, "required");
    }

    // ----- read-only enablers -----

    pub fn make_readonly_select(&mut self, host: &mut dyn Host, control_id: &str) {
        self.readonly.readonly_select(host, control_id);
    }

    pub fn make_tabbable_readonly(&mut self, host: &mut dyn Host, control_id: &str) {
        self.readonly.tabbable_readonly(host, control_id);
    }

    pub fn make_readonly_radio_group(&mut self, host: &mut dyn Host, group_id: &str) {
        self.readonly.readonly_radio_group(host, group_id);
    }

    // ----- event pipeline -----

    /// Entry point for every control event the host forwards. `trusted` is
    /// true for real user interaction; synthetic dispatches pass false so a
    /// repaint can never echo into another repaint.
    pub fn notify(
        &mut self,
        host: &mut dyn Host,
        control_id: &str,
        event: FieldEvent,
        trusted: bool,
    ) {
        if self.readonly.intercept(host, control_id) {
            return;
        }
        if let Some(filter) = self.filters.get(control_id).cloned() {
            self.apply_filter(host, control_id, &filter, event);
        }
        self.recompute_joins_for(host, control_id);
        if event == FieldEvent::Input {
            return;
        }

        self.suppress_focus_until = self.sched.now() + FOCUS_SUPPRESS_MS;
        if !self.active {
            return;
        }
        let base = registry::normalize_base(control_id);
        let field_type = self.resolved_type(&*host, &base);
        self.updates_on_change(host, &base, field_type, trusted);
    }

    fn apply_filter(
        &mut self,
        host: &mut dyn Host,
        control_id: &str,
        filter: &InputFilter,
        event: FieldEvent,
    ) {
        let current = host.value(control_id).unwrap_or_default();
        let next = match (filter, event) {
            (InputFilter::Phone, FieldEvent::Input) => rules::phone::sanitize(&current),
            (InputFilter::Phone, FieldEvent::Blur) => rules::phone::finalize(&current),
            (InputFilter::IntRange(range), FieldEvent::Input) => range.sanitize(&current),
            (InputFilter::IntRange(range), FieldEvent::Blur | FieldEvent::Change) => {
                range.enforce(&current)
            }
            _ => return,
        };
        if next != current {
            host.set_value(control_id, &next);
            if event == FieldEvent::Blur {
                host.dispatch_change(control_id);
            }
        }
    }

    fn recompute_joins_for(&mut self, host: &mut dyn Host, control_id: &str) {
        let joins: Vec<PortalJoin> = self
            .portal_joins
            .iter()
            .filter(|j| j.date_control == control_id || j.time_control == control_id)
            .cloned()
            .collect();
        for join in &joins {
            recompute_join(host, join);
        }
    }

    /// The submit control was pressed. Activates the engine, wires the
    /// live handlers, and flips the button into its processing state; the
    /// host follows up with [`Engine::validate_all`].
    pub fn notify_submit_clicked(&mut self, host: &mut dyn Host) {
        self.active = true;
        self.ensure_live_handlers(host);
        self.announcer.submit_processing(&mut self.sched, host, self.locale);
    }

    /// Full-form validation: recomputes composites, evaluates every record,
    /// applies file-bridge authority, then runs a submit-context global
    /// pass. Returns the resulting page validity.
    pub fn validate_all(&mut self, host: &mut dyn Host) -> bool {
        self.active = true;
        self.ensure_live_handlers(host);
        // A new submit attempt is a new tick: run whatever the previous
        // interaction left due, including the busy-guard release.
        self.advance(host, 0);

        let joins = self.portal_joins.clone();
        for join in &joins {
            recompute_join(host, join);
        }
        for (field, declared) in self.registry.distinct_fields() {
            let base = registry::normalize_base(&field);
            let field_type = inline::resolve_type(&*host, &base, declared);
            refresh_composite(host, &base, field_type);
        }

        let ids: Vec<RecordId> = self.registry.iter().map(|r| r.id).collect();
        for rid in ids {
            self.evaluate_record(host, rid);
        }
        let bridge_fields: Vec<String> = self
            .registry
            .iter()
            .filter(|r| r.kind == ValidatorKind::FileBridge)
            .map(|r| r.field_id.clone())
            .collect();
        for field in &bridge_fields {
            self.apply_bridge_authority(field);
        }

        self.run_global_pass(host, PassContext::Submit);
        self.registry.all_valid()
    }

    /// Re-runs one field's validators. Quiet until first submit unless
    /// `force` is set; returns whether anything ran. A forced run counts as
    /// a trusted edit and rebuilds the summary even before the first submit,
    /// without flipping the activation gate.
    pub fn revalidate(&mut self, host: &mut dyn Host, field_id: &str, force: bool) -> bool {
        if !self.active && !force {
            return false;
        }
        let base = registry::normalize_base(field_id);
        let field_type = self.resolved_type(&*host, &base);
        self.updates_on_change(host, &base, field_type, true);
        if !self.active {
            self.sched.schedule(0, Task::SummaryRefresh { context: PassContext::Change });
        }
        true
    }

    /// Per-field re-validation run after a change. Evaluates the field's
    /// records, applies file-bridge authority, updates the page flags, and
    /// queues the global refresh. Reentrancy-guarded per field.
    fn updates_on_change(
        &mut self,
        host: &mut dyn Host,
        base: &str,
        field_type: FieldType,
        trusted: bool,
    ) {
        if self.registry.is_empty() {
            return;
        }
        if !self.busy_fields.insert(base.to_string()) {
            return;
        }
        refresh_composite(host, base, field_type);
        let ids = self.registry.find_by_targets(base, field_type);
        if ids.is_empty() {
            self.busy_fields.remove(base);
            return;
        }

        let mut any_changed = false;
        for rid in &ids {
            if self.evaluate_record(host, *rid) {
                any_changed = true;
            }
        }
        if field_type == FieldType::File && self.apply_bridge_authority(base) {
            any_changed = true;
        }

        let all_valid = self.registry.all_valid();
        host.set_page_valid(all_valid);
        host.set_block_submit(!all_valid);

        let field_invalid = ids
            .iter()
            .any(|rid| self.registry.get(*rid).map(|r| !r.is_valid).unwrap_or(false));
        if !any_changed && field_invalid && !host.has_inline_error(base) {
            // A widget re-render wiped the inline node; repaint even though
            // no verdict moved.
            any_changed = true;
        }
        if !field_invalid {
            inline::clear(host, base, field_type);
        }
        if self.active {
            self.sched.schedule(0, Task::SummaryRefresh { context: PassContext::Change });
        }
        if trusted {
            if let Some(control) = synthetic_change_target(&*host, base, field_type) {
                self.sched.schedule(0, Task::SyntheticChange { control_id: control });
            }
        }
        debug!(field = %base, repaint = any_changed, invalid = field_invalid, "field revalidated");
        self.busy_fields.remove(base);
    }

    /// A passing file bridge is authoritative: it forces the field's
    /// sibling records valid. A failing bridge forces nothing. Returns
    /// whether any sibling flipped.
    fn apply_bridge_authority(&mut self, field_id: &str) -> bool {
        let ids = self.registry.find_by_targets(field_id, FieldType::File);
        let bridge_passed = ids.iter().any(|rid| {
            self.registry
                .get(*rid)
                .map(|r| r.kind == ValidatorKind::FileBridge && r.is_valid)
                .unwrap_or(false)
        });
        if !bridge_passed {
            return false;
        }
        let mut changed = false;
        for rid in &ids {
            if let Some(rec) = self.registry.get_mut(*rid) {
                if rec.kind != ValidatorKind::FileBridge && !rec.is_valid {
                    rec.is_valid = true;
                    rec.failure = None;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Evaluates one record, in place. Returns whether its validity flipped.
    /// A rule function that itself fails leaves the record untouched.
    fn evaluate_record(&mut self, host: &mut dyn Host, rid: RecordId) -> bool {
        let (kind, native_id, field_id, field_type, was_valid) = match self.registry.get(rid) {
            Some(r) => (r.kind, r.native_id.clone(), r.field_id.clone(), r.field_type, r.is_valid),
            None => return false,
        };

        let outcome: Option<(bool, Option<RuleFailure>, Option<String>)> = match kind {
            ValidatorKind::PlatformNative => native_id
                .as_deref()
                .and_then(|nid| host.evaluate_native(nid))
                .map(|valid| {
                    let failure = (!valid).then(|| classify_native(native_id.as_deref()));
                    (valid, failure, None)
                }),
            ValidatorKind::FileBridge => {
                let h: &dyn Host = &*host;
                let config = rules::file::config_for(h, &field_id, self.default_max_file_bytes);
                let verdict = rules::file::evaluate(h, &field_id, &config);
                let message = match verdict.failure {
                    None => String::new(),
                    Some(failure) => {
                        let text = self.resolve_file_message(h, &field_id, failure, &config);
                        messages::anchor_markup(&field_id, &text)
                    }
                };
                Some((verdict.valid, verdict.failure, Some(message)))
            }
            ValidatorKind::Custom(rule_id) => {
                let Some(rule) = self.custom_rules.get(&rule_id).cloned() else {
                    return false;
                };
                let h: &dyn Host = &*host;
                let ctx = FieldContext {
                    field_id: &field_id,
                    field_type,
                    locale: self.locale,
                    host: h,
                };
                match (rule.evaluate)(&ctx) {
                    Ok(valid) => {
                        let failure = (!valid).then(|| {
                            if self.required_rules.contains(&rule_id) {
                                RuleFailure::Required
                            } else {
                                RuleFailure::CustomRuleFailure
                            }
                        });
                        Some((valid, failure, None))
                    }
                    Err(err) => {
                        warn!(field = %field_id, error = %err, "rule function failed; verdict unchanged");
                        None
                    }
                }
            }
        };

        let Some((valid, failure, message)) = outcome else {
            return false;
        };
        match self.registry.get_mut(rid) {
            Some(rec) => {
                rec.is_valid = valid;
                rec.failure = failure;
                if let Some(m) = message {
                    rec.error_message = m;
                }
                valid != was_valid
            }
            None => false,
        }
    }

    /// Resolves the display text for a file-rule failure: field override
    /// attribute, then the platform required message on the hidden filename
    /// control (required only), then the built-in defaults.
    fn resolve_file_message(
        &self,
        host: &dyn Host,
        field_id: &str,
        failure: RuleFailure,
        config: &rules::file::FileConfig,
    ) -> String {
        let input = rules::file::input_control(host, field_id);
        let template = messages::override_attr(failure, self.locale)
            .and_then(|attr| host.attr(&input, &attr))
            .filter(|v| !v.trim().is_empty());
        if let Some(template) = template {
            return interpolate(&template, failure, config);
        }
        if failure == RuleFailure::Required {
            if let Some(text) = self.registry.platform_required_message(field_id) {
                return text;
            }
        }
        interpolate(messages::default_message(failure, self.locale), failure, config)
    }

    /// The whole-form pass: clean slate, collect, repaint, refresh flags,
    /// queue the settled summary render. Coalesced per tick by the global
    /// busy guard.
    fn run_global_pass(&mut self, host: &mut dyn Host, context: PassContext) {
        if self.global_busy {
            return;
        }
        self.global_busy = true;
        self.sched.schedule(0, Task::ClearGlobalBusy);

        if !self.native_announcement_cleared {
            host.clear_native_summary_announcement();
            self.native_announcement_cleared = true;
        }

        // Clean slate: every field's inline node goes before any repaint.
        let mut bases: Vec<(String, FieldType)> = Vec::new();
        for (field, declared) in self.registry.distinct_fields() {
            let base = registry::normalize_base(&field);
            if !bases.iter().any(|(b, _)| *b == base) {
                let resolved = inline::resolve_type(&*host, &base, declared);
                bases.push((base, resolved));
            }
        }
        for (base, field_type) in &bases {
            inline::clear(host, base, *field_type);
        }

        let items = summary::collect(&mut self.registry, &*host, self.locale);
        let has_errors = !items.is_empty();

        let all_valid = self.registry.all_valid();
        host.set_page_valid(all_valid);
        host.set_block_submit(!all_valid);
        if has_errors {
            // A failed submit leaves the button in processing state; put it
            // back so the user can correct and retry.
            self.announcer.submit_default(&mut self.sched, host, self.locale);
        }

        for item in &items {
            inline::paint(host, &item.base, item.field_type, &item.message);
        }

        let error_count = items.len();
        let heading = if has_errors {
            messages::summary_heading(self.locale, error_count)
        } else {
            String::new()
        };
        if context == PassContext::Submit {
            host.announce(Channel::PoliteSummary, &heading);
        }
        self.sched.schedule(SETTLE_RENDER_MS, Task::RenderSummary { context, heading, items });
        debug!(errors = error_count, context = ?context, "global validation pass");
    }

    fn render_summary(
        &mut self,
        host: &mut dyn Host,
        context: PassContext,
        heading: String,
        items: Vec<summary::SummaryItem>,
    ) {
        if items.is_empty() {
            host.hide_summary();
            if context == PassContext::Submit {
                host.announce(Channel::PoliteSummary, "");
            }
            return;
        }
        let entries = summary::build_entries(self.locale, &items);
        host.show_summary(&heading, &entries);
        if context == PassContext::Submit {
            self.announcer.announce_summary(&mut self.sched, host, &heading);
        }
    }

    fn ensure_live_handlers(&mut self, host: &mut dyn Host) {
        if self.live_handlers_attached {
            return;
        }
        self.live_handlers_attached = true;
        for (field, declared) in self.registry.distinct_fields() {
            let base = registry::normalize_base(&field);
            let field_type = inline::resolve_type(&*host, &base, declared);
            let control = inline::focusable_control(&*host, &base, field_type);
            host.attach_change_listener(&control);
        }
    }

    fn resolved_type(&self, host: &dyn Host, base: &str) -> FieldType {
        let declared = self
            .registry
            .iter()
            .find(|r| registry::normalize_base(&r.field_id) == base)
            .map(|r| r.field_type)
            .unwrap_or(FieldType::Text);
        inline::resolve_type(host, base, declared)
    }

    // ----- clock -----

    /// Drives the logical clock forward, running every task that comes due
    /// along the way at the time it would actually have fired.
    pub fn advance(&mut self, host: &mut dyn Host, ms: u64) {
        let target = self.sched.now() + ms;
        loop {
            while let Some(task) = self.sched.pop_due() {
                self.execute(host, task);
            }
            match self.sched.next_due().filter(|due| *due <= target) {
                Some(due) => self.sched.set_now(due),
                None => break,
            }
        }
        self.sched.set_now(target);
        while let Some(task) = self.sched.pop_due() {
            self.execute(host, task);
        }
    }

    fn execute(&mut self, host: &mut dyn Host, task: Task) {
        match task {
            Task::SummaryRefresh { context } => self.run_global_pass(host, context),
            Task::RenderSummary { context, heading, items } => {
                self.render_summary(host, context, heading, items)
            }
            Task::AnnounceAssertiveSummary { text } => {
                host.announce(Channel::AssertiveSummary, &text)
            }
            Task::ClearAssertiveSummary => host.announce(Channel::AssertiveSummary, ""),
            Task::AnnounceSubmitControl { text } => host.announce(Channel::SubmitControl, &text),
            Task::ReannounceSubmitControl { text } => {
                self.announcer.reannounce_fired();
                host.announce(Channel::SubmitControl, &text);
            }
            Task::SyntheticChange { control_id } => host.dispatch_change(&control_id),
            Task::RevalidateField { field_id, field_type } => {
                if field_type == FieldType::File {
                    self.sync_delete_button(host, &field_id);
                }
                self.updates_on_change(host, &field_id, field_type, false);
            }
            Task::ClearGlobalBusy => self.global_busy = false,
        }
    }
}

fn classify_native(native_id: Option<&str>) -> RuleFailure {
    match native_id {
        Some(nid) if nid.starts_with("RequiredFieldValidator") => RuleFailure::Required,
        _ => RuleFailure::CustomRuleFailure,
    }
}

fn interpolate(template: &str, failure: RuleFailure, config: &rules::file::FileConfig) -> String {
    match failure {
        RuleFailure::MaxSize => messages::interpolate_max_size(template, config.max_bytes),
        RuleFailure::FileTypes => messages::interpolate_file_types(template, &config.allowed_ext),
        _ => template.to_string(),
    }
}

/// Pulls a composite widget's picker values into its base control so the
/// base carries the joined value its validators check.
fn refresh_composite(host: &mut dyn Host, base: &str, field_type: FieldType) {
    if !matches!(field_type, FieldType::Date | FieldType::Time) || !host.control_exists(base) {
        return;
    }
    let joined = rules::datetime::composite_value(&*host, base);
    if host.value(base).as_deref() != Some(joined.as_str()) {
        host.set_value(base, &joined);
    }
}

fn recompute_join(host: &mut dyn Host, join: &PortalJoin) {
    let date = host.value(&join.date_control).unwrap_or_default();
    let time = host.value(&join.time_control).unwrap_or_default();
    let joined = rules::datetime::join_strict(&date, &time);
    if host.value(&join.portal).unwrap_or_default() != joined {
        host.set_value(&join.portal, &joined);
        host.dispatch_change(&join.portal);
    }
}

/// The control a synthetic change is dispatched on after a trusted edit,
/// so the host runtime's own listeners see the same event the user caused.
fn synthetic_change_target(host: &dyn Host, base: &str, field_type: FieldType) -> Option<String> {
    match field_type {
        FieldType::Date => {
            let control = format!("{base}_datepicker_description");
            host.control_exists(&control).then_some(control)
        }
        FieldType::Time => ["_timepicker_description", "_timepicker"]
            .iter()
            .map(|suffix| format!("{base}{suffix}"))
            .find(|c| host.control_exists(c)),
        FieldType::Lookup => {
            let name = format!("{base}_name");
            if host.control_exists(&name) {
                Some(name)
            } else {
                host.control_exists(base).then(|| base.to_string())
            }
        }
        FieldType::File | FieldType::Text => {
            host.control_exists(base).then(|| base.to_string())
        }
    }
}
