//! The validator registry: the single owned, ordered collection of
//! validator records for the page.
//!
//! The registry is the one source of truth for validity. It is owned by the
//! engine and passed by reference to presenters; presenters never cache
//! derived state across invocations. Insertion keeps same-field records
//! adjacent (new records go immediately after the last existing record for
//! that field), and removal always walks in reverse index order so the
//! registry is never iterated while being displaced under its own feet.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::RuleFailure;
use crate::messages;
use crate::rules::FieldType;

/// Stable handle for one registered record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub(crate) u64);

/// Handle into the engine's custom-rule lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub(crate) u64);

/// What kind of check a record performs. Rule functions themselves live in
/// a lookup table on the engine; records only carry the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorKind {
    /// A validator object owned by the host runtime, evaluated through the
    /// host's base execution primitive.
    PlatformNative,
    /// The rich file check. At most one per field; a passing bridge is
    /// authoritative over the field's sibling records.
    FileBridge,
    /// An externally supplied rule, dispatched by id.
    Custom(RuleId),
}

/// One registered constraint check for a field.
#[derive(Debug, Clone)]
pub struct ValidatorRecord {
    pub id: RecordId,
    pub field_id: String,
    pub kind: ValidatorKind,
    /// The host runtime's own id for platform-native records
    /// (e.g. `RequiredFieldValidatorname`).
    pub native_id: Option<String>,
    /// Tri-state in spirit: defaults true until an evaluation says otherwise.
    pub is_valid: bool,
    /// Resolved display string, HTML-safe anchor markup.
    pub error_message: String,
    /// Why the record is currently invalid, when it is.
    pub failure: Option<RuleFailure>,
    /// Insertion sequence, used for tie-breaks when deduplicating.
    pub source_order: u64,
    pub field_type: FieldType,
}

static COMPOSITE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(_datepicker(_description)?|_timepicker(_description)?|_name|_value|_entityname|_text|_input_file)$",
    )
    .unwrap()
});
static HIDDEN_FILE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_?hidden_(filename|filetype|file_size)$").unwrap());

/// Strips known composite-widget suffixes so multi-control fields share one
/// base id for all human-facing messages.
pub fn normalize_base(id: &str) -> String {
    let stripped = HIDDEN_FILE_SUFFIX.replace(id, "");
    COMPOSITE_SUFFIX.replace(&stripped, "").to_string()
}

/// Whether a control id names one of the host runtime's hidden file-mirror
/// partners. Their validators are suppressed outright.
pub fn is_hidden_file_mirror(id: &str) -> bool {
    HIDDEN_FILE_SUFFIX.is_match(id)
}

/// The set of underlying control ids a logical field may carry validators
/// on, by type.
pub fn expand_targets(field_id: &str, field_type: FieldType) -> Vec<String> {
    let mut targets = vec![field_id.to_string()];
    match field_type {
        FieldType::Lookup => {
            for suffix in ["_name", "_value", "_entityname", "_text"] {
                targets.push(format!("{field_id}{suffix}"));
            }
        }
        FieldType::File => {
            targets.push(format!("{field_id}_input_file"));
            for suffix in ["_hidden_filename", "_hidden_filetype", "_hidden_file_size"] {
                targets.push(format!("{field_id}{suffix}"));
            }
            // Some templates drop the separating underscore.
            for suffix in ["hidden_filename", "hidden_filetype", "hidden_file_size"] {
                targets.push(format!("{field_id}{suffix}"));
            }
        }
        _ => {}
    }
    targets
}

#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    records: Vec<ValidatorRecord>,
    next_id: u64,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidatorRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ValidatorRecord> {
        self.records.iter_mut()
    }

    pub fn get(&self, id: RecordId) -> Option<&ValidatorRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut ValidatorRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// Registers a record for `field_id`, inserting immediately after the
    /// last existing record sharing the same control id (platform-native
    /// records are never displaced behind custom ones). Silent no-op when
    /// `field_id` is empty.
    pub fn register(
        &mut self,
        field_id: &str,
        field_type: FieldType,
        kind: ValidatorKind,
        error_message: String,
    ) -> Option<RecordId> {
        if field_id.is_empty() {
            return None;
        }
        let id = RecordId(self.next_id);
        let record = ValidatorRecord {
            id,
            field_id: field_id.to_string(),
            kind,
            native_id: None,
            is_valid: true,
            error_message,
            failure: None,
            source_order: self.next_id,
            field_type,
        };
        self.next_id += 1;

        let last_same = self
            .records
            .iter()
            .rposition(|r| r.field_id == field_id);
        match last_same {
            Some(idx) => self.records.insert(idx + 1, record),
            None => self.records.push(record),
        }
        Some(id)
    }

    /// Adopts one of the host runtime's native validator objects.
    pub fn adopt_native(
        &mut self,
        field_id: &str,
        native_id: &str,
        error_message: String,
        field_type: FieldType,
    ) -> Option<RecordId> {
        let id = self.register(field_id, field_type, ValidatorKind::PlatformNative, error_message)?;
        if let Some(rec) = self.get_mut(id) {
            rec.native_id = Some(native_id.to_string());
        }
        Some(id)
    }

    pub fn has_file_bridge(&self, field_id: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.field_id == field_id && r.kind == ValidatorKind::FileBridge)
    }

    /// Removes all custom (non-platform-native) records for `field_id`, in
    /// reverse index order. Returns the removed records so the caller can
    /// detach listeners.
    pub fn unregister_custom(&mut self, field_id: &str) -> Vec<ValidatorRecord> {
        let mut removed = Vec::new();
        for i in (0..self.records.len()).rev() {
            if self.records[i].field_id == field_id
                && self.records[i].kind != ValidatorKind::PlatformNative
            {
                removed.push(self.records.remove(i));
            }
        }
        removed
    }

    /// Removes the file-bridge record for `field_id`, if present.
    pub fn remove_file_bridge(&mut self, field_id: &str) {
        for i in (0..self.records.len()).rev() {
            if self.records[i].field_id == field_id
                && self.records[i].kind == ValidatorKind::FileBridge
            {
                self.records.remove(i);
            }
        }
    }

    /// Whether any custom records remain for `field_id`.
    pub fn has_custom(&self, field_id: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.field_id == field_id && r.kind != ValidatorKind::PlatformNative)
    }

    /// Records for one control id, in registry order.
    pub fn find_by_field(&self, field_id: &str) -> Vec<RecordId> {
        self.records
            .iter()
            .filter(|r| r.field_id == field_id)
            .map(|r| r.id)
            .collect()
    }

    /// Records attached to any of a logical field's underlying controls,
    /// falling back to exact-id matches when the expansion finds nothing.
    pub fn find_by_targets(&self, field_id: &str, field_type: FieldType) -> Vec<RecordId> {
        let targets = expand_targets(field_id, field_type);
        let matched: Vec<RecordId> = self
            .records
            .iter()
            .filter(|r| targets.iter().any(|t| *t == r.field_id))
            .map(|r| r.id)
            .collect();
        if matched.is_empty() {
            self.find_by_field(field_id)
        } else {
            matched
        }
    }

    /// The distinct control ids that currently carry records, in first-seen
    /// registry order.
    pub fn distinct_fields(&self) -> Vec<(String, FieldType)> {
        let mut seen = Vec::new();
        for r in &self.records {
            if !seen.iter().any(|(f, _)| *f == r.field_id) {
                seen.push((r.field_id.clone(), r.field_type));
            }
        }
        seen
    }

    /// Logical-AND of every record's validity.
    pub fn all_valid(&self) -> bool {
        self.records.iter().all(|r| r.is_valid)
    }

    /// Reuses the platform required-validator message attached to a file
    /// field's hidden filename control, if any, stripped to plain text.
    pub fn platform_required_message(&self, field_id: &str) -> Option<String> {
        let hidden_ids = [
            format!("{field_id}hidden_filename"),
            format!("{field_id}_hidden_filename"),
        ];
        for hid in &hidden_ids {
            for r in &self.records {
                if r.field_id != *hid {
                    continue;
                }
                match &r.native_id {
                    Some(nid) if nid.starts_with("RequiredFieldValidator") => {}
                    _ => continue,
                }
                let text = messages::html_to_text(&r.error_message);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Drops the host runtime's stock integer/range validators for the given
    /// base ids, keeping required validators intact. Removal is bottom-up to
    /// keep indexes valid; each dropped record is marked valid first so no
    /// stale invalid verdict lingers anywhere.
    pub fn suppress_stock_int_range(&mut self, base_ids: &[&str]) -> usize {
        let mut removed = 0;
        for i in (0..self.records.len()).rev() {
            let r = &mut self.records[i];
            if !base_ids.contains(&r.field_id.as_str()) {
                continue;
            }
            let stock = match &r.native_id {
                Some(nid) => {
                    nid.starts_with("IntegerValidator") || nid.starts_with("RangeValidator")
                }
                None => false,
            };
            if stock {
                r.is_valid = true;
                self.records.remove(i);
                removed += 1;
            }
        }
        removed
    }
}
