//! Date and time normalization and the composite date+time join.
//!
//! Time inputs arrive in three shapes: 24h (`14:30`), bilingual
//! (`14 h 30`), and 12h with an AM/PM marker (`2:30 p.m.`). All are
//! normalized to 24h before concatenation. Dates arrive as ISO
//! (`2026-01-08`) or `D/M/YYYY`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::host::Host;

static FR_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([01]?\d|2[0-3])\s*[hH]\s*([0-5]\d)\s*$").unwrap());
static AMPM_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,2}):([0-5]\d)(?::([0-5]\d))?\s*([AaPp])\.?\s*[Mm]\.?\s*$").unwrap()
});
static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap());
static DMY_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").unwrap());

/// Normalizes common bilingual time inputs to 24h `HH:mm[:ss]`.
/// Unrecognized values pass through trimmed.
pub fn normalize_time(t: &str) -> String {
    let s = t.trim();
    if s.is_empty() {
        return String::new();
    }
    if let Some(caps) = FR_TIME.captures(s) {
        let h: u32 = caps[1].parse().unwrap_or(0);
        return format!("{h:02}:{}", &caps[2]);
    }
    if let Some(caps) = AMPM_TIME.captures(s) {
        let mut h: u32 = caps[1].parse::<u32>().unwrap_or(0) % 12;
        if caps[4].eq_ignore_ascii_case("p") {
            h += 12;
        }
        let seconds = caps.get(3).map(|m| format!(":{}", m.as_str())).unwrap_or_default();
        return format!("{h:02}:{}{seconds}", &caps[2]);
    }
    s.to_string()
}

/// Normalizes a date to ISO `YYYY-MM-DD`, accepting ISO and `D/M/YYYY`.
/// Anything else yields empty.
pub fn normalize_date(d: &str) -> String {
    let s = d.trim();
    if ISO_DATE.is_match(s) {
        return s.to_string();
    }
    if let Some(caps) = DMY_DATE.captures(s) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        return format!("{}-{month:02}-{day:02}", &caps[3]);
    }
    String::new()
}

/// Joins a base field's date and time partner controls into one normalized
/// value: `YYYY-MM-DD HH:mm`, the lone part when only one is present, or
/// empty.
pub fn composite_value(host: &dyn Host, base_id: &str) -> String {
    let date = host
        .value(&format!("{base_id}_datepicker_description"))
        .unwrap_or_default()
        .trim()
        .to_string();
    let time = host
        .value(&format!("{base_id}_timepicker_description"))
        .or_else(|| host.value(&format!("{base_id}_timepicker")))
        .unwrap_or_default()
        .trim()
        .to_string();

    let time = if time.is_empty() { time } else { normalize_time(&time) };

    match (date.is_empty(), time.is_empty()) {
        (false, false) => format!("{date} {time}"),
        (false, true) => date,
        (true, false) => time,
        (true, true) => String::new(),
    }
}

/// Strict variant used by portal joins: both halves must normalize or the
/// joined value is empty.
pub fn join_strict(date: &str, time: &str) -> String {
    let d = normalize_date(date);
    let t = normalize_time(time);
    if !d.is_empty() && !t.is_empty() {
        format!("{d} {t}")
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PageModel;

    #[test]
    fn bilingual_hour_forms_normalize() {
        assert_eq!(normalize_time("14 h 30"), "14:30");
        assert_eq!(normalize_time("14h30"), "14:30");
        assert_eq!(normalize_time("2 h 30"), "02:30");
    }

    #[test]
    fn am_pm_forms_normalize_to_24h() {
        assert_eq!(normalize_time("2:30 PM"), "14:30");
        assert_eq!(normalize_time("2:30 p.m."), "14:30");
        assert_eq!(normalize_time("12:05 am"), "00:05");
        assert_eq!(normalize_time("12:05 pm"), "12:05");
        assert_eq!(normalize_time("1:02:03 pm"), "13:02:03");
    }

    #[test]
    fn twenty_four_hour_forms_pass_through() {
        assert_eq!(normalize_time("14:30"), "14:30");
        assert_eq!(normalize_time("  09:00 "), "09:00");
        assert_eq!(normalize_time(""), "");
    }

    #[test]
    fn dates_normalize_to_iso() {
        assert_eq!(normalize_date("2026-01-08"), "2026-01-08");
        assert_eq!(normalize_date("8/1/2026"), "2026-01-08");
        assert_eq!(normalize_date("08-01-2026"), "2026-01-08");
        assert_eq!(normalize_date("January 8"), "");
    }

    #[test]
    fn composite_join_handles_all_presence_combinations() {
        let mut page = PageModel::new("en");
        page.add_control("when_datepicker_description", "2026-01-08");
        page.add_control("when_timepicker_description", "2 h 30");
        assert_eq!(composite_value(&page, "when"), "2026-01-08 02:30");

        page.set_value("when_timepicker_description", "");
        assert_eq!(composite_value(&page, "when"), "2026-01-08");

        page.set_value("when_datepicker_description", "");
        page.set_value("when_timepicker_description", "14:00");
        assert_eq!(composite_value(&page, "when"), "14:00");

        page.set_value("when_timepicker_description", "");
        assert_eq!(composite_value(&page, "when"), "");
    }

    #[test]
    fn strict_join_requires_both_halves() {
        assert_eq!(join_strict("2026-01-08", "2 h 30"), "2026-01-08 02:30");
        assert_eq!(join_strict("2026-01-08", ""), "");
        assert_eq!(join_strict("", "14:30"), "");
    }
}
