//! File upload constraints and the stored-file query.
//!
//! Checks run in a fixed order and the first failing check wins:
//! required, then non-empty, then max size, then extension allow-list.
//! "Required" is satisfied by a previously stored server-side file, which
//! is resolved through one central precedence chain (never scattered per
//! call site): deletion marker, explicit has-file flag, stored filename,
//! empty filename holder, visible label text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::RuleFailure;
use crate::host::Host;
use crate::rules::Verdict;

/// Default maximum upload size: 4 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 4 * 1024 * 1024;

/// Default extension allow-list.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "png", "gif"];

/// Resolved file constraints for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    pub allowed_ext: Vec<String>,
    pub max_bytes: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        FileConfig {
            allowed_ext: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

static EXT_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s;|]+").unwrap());
static NO_FILE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Aucun fichier sélectionné|No file selected").unwrap());

/// Reads the per-field constraint attributes off the file input, falling
/// back to `global_max_bytes` (the page-wide override) and the defaults.
pub fn config_for(host: &dyn Host, field_id: &str, global_max_bytes: Option<u64>) -> FileConfig {
    let input = input_control(host, field_id);
    let allowed_ext = match host.attr(&input, "data-allowed-ext") {
        Some(raw) if !raw.trim().is_empty() => EXT_SPLIT
            .split(&raw)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => FileConfig::default().allowed_ext,
    };
    let max_bytes = host
        .attr(&input, "data-max-bytes")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .or(global_max_bytes)
        .unwrap_or(DEFAULT_MAX_BYTES);
    FileConfig { allowed_ext, max_bytes }
}

/// The control id the file input actually lives on.
pub fn input_control(host: &dyn Host, field_id: &str) -> String {
    let partner = format!("{field_id}_input_file");
    if host.control_exists(&partner) {
        partner
    } else {
        field_id.to_string()
    }
}

/// Whether a previously stored server-side file exists for the field.
///
/// Precedence, first signal wins:
/// 1. an explicit deletion marker says the file was removed → absent;
/// 2. an explicit has-file flag on the container → present;
/// 3. a non-empty stored filename value → present;
/// 4. a filename holder that exists but is empty → absent (a stale visible
///    label must not resurrect the file);
/// 5. last resort, a visible label with text other than the "no file
///    selected" placeholder in either language.
pub fn stored_file_present(host: &dyn Host, field_id: &str) -> bool {
    let change_ids =
        [format!("{field_id}hidden_file_change"), format!("{field_id}_hidden_file_change")];
    for id in &change_ids {
        if let Some(v) = host.value(id) {
            if v.trim().eq_ignore_ascii_case("delete") {
                return false;
            }
        }
    }

    let input = input_control(host, field_id);
    if let Some(flag) = host.attr(&input, "data-has-server-file") {
        let flag = flag.trim();
        if flag.is_empty() || flag == "true" || flag == "1" {
            return true;
        }
    }

    let filename_ids =
        [format!("{field_id}hidden_filename"), format!("{field_id}_hidden_filename")];
    let mut holder_exists = false;
    for id in &filename_ids {
        if host.control_exists(id) {
            holder_exists = true;
            if let Some(v) = host.value(id) {
                if !v.trim().is_empty() {
                    return true;
                }
            }
        }
    }
    if holder_exists {
        return false;
    }

    let label = format!("{field_id}_file_name");
    if let Some(text) = host.text(&label) {
        let text = text.trim().to_string();
        if !text.is_empty() && !NO_FILE_PLACEHOLDER.is_match(&text) {
            return true;
        }
    }
    false
}

/// Evaluates the file constraints for a field against its current
/// selection. First failing check wins.
pub fn evaluate(host: &dyn Host, field_id: &str, config: &FileConfig) -> Verdict {
    let selection = host.selected_file(field_id);

    let file = match selection {
        None => {
            if stored_file_present(host, field_id) {
                return Verdict::pass();
            }
            return Verdict::fail(RuleFailure::Required);
        }
        Some(f) => f,
    };

    if file.size == 0 {
        return Verdict::fail(RuleFailure::ZeroByte);
    }
    if file.size > config.max_bytes {
        return Verdict::fail(RuleFailure::MaxSize);
    }

    let name = file.name.trim();
    let dot = name.rfind('.');
    let ext = match dot {
        Some(0) | None => return Verdict::fail(RuleFailure::FileTypes),
        Some(i) => name[i + 1..].to_lowercase(),
    };
    if !config.allowed_ext.iter().any(|a| *a == ext) {
        return Verdict::fail(RuleFailure::FileTypes);
    }
    Verdict::pass()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FileSelection, PageModel};

    fn page_with_file_field() -> PageModel {
        let mut page = PageModel::new("en");
        page.add_file_field("doc", "Supporting document");
        page
    }

    #[test]
    fn stored_filename_satisfies_required() {
        let mut page = page_with_file_field();
        page.add_control("doc_hidden_filename", "old.pdf");
        let verdict = evaluate(&page, "doc", &FileConfig::default());
        assert!(verdict.valid);
    }

    #[test]
    fn deletion_marker_beats_stored_filename() {
        let mut page = page_with_file_field();
        page.add_control("doc_hidden_filename", "old.pdf");
        page.add_control("doc_hidden_file_change", "delete");
        let verdict = evaluate(&page, "doc", &FileConfig::default());
        assert_eq!(verdict.failure, Some(RuleFailure::Required));
    }

    #[test]
    fn empty_filename_holder_blocks_stale_label_fallback() {
        let mut page = page_with_file_field();
        page.add_control("doc_hidden_filename", "");
        page.set_text("doc_file_name", "stale.pdf");
        assert!(!stored_file_present(&page, "doc"));
    }

    #[test]
    fn visible_label_is_last_resort_and_ignores_placeholders() {
        let mut page = page_with_file_field();
        page.set_text("doc_file_name", "report.pdf");
        assert!(stored_file_present(&page, "doc"));
        page.set_text("doc_file_name", "No file selected");
        assert!(!stored_file_present(&page, "doc"));
        page.set_text("doc_file_name", "Aucun fichier sélectionné");
        assert!(!stored_file_present(&page, "doc"));
    }

    #[test]
    fn max_size_boundary_is_inclusive() {
        let mut page = page_with_file_field();
        let config = FileConfig::default();
        page.set_file("doc", FileSelection::new("a.pdf", config.max_bytes));
        assert!(evaluate(&page, "doc", &config).valid);
        page.set_file("doc", FileSelection::new("a.pdf", config.max_bytes + 1));
        assert_eq!(evaluate(&page, "doc", &config).failure, Some(RuleFailure::MaxSize));
    }

    #[test]
    fn zero_byte_file_fails_before_type_check() {
        let mut page = page_with_file_field();
        page.set_file("doc", FileSelection::new("weird.exe", 0));
        assert_eq!(
            evaluate(&page, "doc", &FileConfig::default()).failure,
            Some(RuleFailure::ZeroByte)
        );
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let mut page = page_with_file_field();
        page.set_file("doc", FileSelection::new("report.PDF", 100));
        assert!(evaluate(&page, "doc", &FileConfig::default()).valid);
    }

    #[test]
    fn missing_or_leading_dot_fails_type_check() {
        let mut page = page_with_file_field();
        page.set_file("doc", FileSelection::new("report", 100));
        assert_eq!(
            evaluate(&page, "doc", &FileConfig::default()).failure,
            Some(RuleFailure::FileTypes)
        );
        page.set_file("doc", FileSelection::new(".pdf", 100));
        assert_eq!(
            evaluate(&page, "doc", &FileConfig::default()).failure,
            Some(RuleFailure::FileTypes)
        );
    }

    #[test]
    fn allow_list_attribute_splits_on_mixed_delimiters() {
        let mut page = page_with_file_field();
        page.set_attr("doc_input_file", "data-allowed-ext", "PDF, docx; png |txt");
        let config = config_for(&page, "doc", None);
        assert_eq!(config.allowed_ext, vec!["pdf", "docx", "png", "txt"]);
    }

    #[test]
    fn max_bytes_attribute_overrides_global_override() {
        let mut page = page_with_file_field();
        page.set_attr("doc_input_file", "data-max-bytes", "1024");
        let config = config_for(&page, "doc", Some(2048));
        assert_eq!(config.max_bytes, 1024);
        page.remove_attr("doc_input_file", "data-max-bytes");
        let config = config_for(&page, "doc", Some(2048));
        assert_eq!(config.max_bytes, 2048);
    }
}
