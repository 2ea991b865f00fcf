//! Cell-level coercion: raw text → typed values.
//!
//! Every function here is pure and total. A cell that cannot be coerced
//! becomes `None` (or an empty string) instead of an error, so one bad cell
//! never aborts a row and one bad row never aborts a batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Kilograms → pounds conversion factor.
pub const KG_TO_LB: f64 = 2.20462;

/// Full-date layouts tried in order after the ISO fast path.
const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

/// Trim whitespace and strip one pair of outer double quotes, if present.
pub fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a free-form date cell.
///
/// Accepts ISO dates, RFC 3339 and common datetime layouts (time is
/// discarded), slash/dot separated dates, compact `YYYYMMDD`, spelled-out
/// month names, and partial `YYYY-MM` / `YYYY` dates (first day of the
/// period). Returns `None` for empty or unrecognized input.
pub fn coerce_date(raw: &str) -> Option<NaiveDate> {
    let s = clean_text(raw);
    if s.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&s, fmt) {
            return Some(d);
        }
    }

    parse_compact_or_partial(&s)
}

/// `YYYYMMDD`, `YYYY-MM`, `YYYY`, or an ISO date followed by anything.
fn parse_compact_or_partial(s: &str) -> Option<NaiveDate> {
    let all_digits = s.chars().all(|c| c.is_ascii_digit());

    if all_digits && s.len() == 8 {
        let year: i32 = s[0..4].parse().ok()?;
        let month: u32 = s[4..6].parse().ok()?;
        let day: u32 = s[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if all_digits && s.len() == 4 {
        let year: i32 = s.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    if s.len() == 7 && matches!(s.get(4..5), Some("-" | "/")) {
        let year: i32 = s.get(0..4)?.parse().ok()?;
        let month: u32 = s.get(5..7)?.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }
    if s.len() > 10 && s.is_char_boundary(10) {
        return NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d").ok();
    }
    None
}

/// Parse a numeric cell, ignoring units and thousands separators.
///
/// Keeps digits, `.`, and a minus sign only when it is the first kept
/// character, then parses. `"100kg"` → `100`, `"1,234.5"` → `1234.5`,
/// `"-"` / `"bad"` / `"1.2.3"` → `None`. Never returns NaN or infinity.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let mut kept = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() || c == '.' {
            kept.push(c);
        } else if c == '-' && kept.is_empty() {
            kept.push(c);
        }
    }

    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    kept.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Grouping key for a display name.
///
/// Lowercases, drops everything outside ASCII letters, digits and
/// whitespace, collapses whitespace runs to one space, and trims.
/// Idempotent: `normalize_name(&normalize_name(x)) == normalize_name(x)`.
pub fn normalize_name(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let kept: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Kilograms → pounds, rounded to two decimal places.
pub fn kg_to_lb(kg: f64) -> f64 {
    (kg * KG_TO_LB * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_date_iso() {
        assert_eq!(coerce_date("2020-01-05"), ymd(2020, 1, 5));
        assert_eq!(coerce_date("  2020-01-05 "), ymd(2020, 1, 5));
    }

    #[test]
    fn test_date_timestamps_drop_time() {
        assert_eq!(coerce_date("2021-03-10 14:22:00"), ymd(2021, 3, 10));
        assert_eq!(coerce_date("2021-03-10T14:22:00Z"), ymd(2021, 3, 10));
        assert_eq!(coerce_date("2021-03-10T14:22:00.123"), ymd(2021, 3, 10));
    }

    #[test]
    fn test_date_alternate_layouts() {
        assert_eq!(coerce_date("2019/11/30"), ymd(2019, 11, 30));
        assert_eq!(coerce_date("11/30/2019"), ymd(2019, 11, 30));
        assert_eq!(coerce_date("30.11.2019"), ymd(2019, 11, 30));
        assert_eq!(coerce_date("20191130"), ymd(2019, 11, 30));
        assert_eq!(coerce_date("March 4, 2018"), ymd(2018, 3, 4));
        assert_eq!(coerce_date("4 Mar 2018"), ymd(2018, 3, 4));
        assert_eq!(coerce_date("\"2018-03-04\""), ymd(2018, 3, 4));
    }

    #[test]
    fn test_date_partial() {
        assert_eq!(coerce_date("2018-06"), ymd(2018, 6, 1));
        assert_eq!(coerce_date("2018"), ymd(2018, 1, 1));
    }

    #[test]
    fn test_date_invalid_is_none() {
        assert_eq!(coerce_date(""), None);
        assert_eq!(coerce_date("   "), None);
        assert_eq!(coerce_date("not a date"), None);
        assert_eq!(coerce_date("2020-02-30"), None);
        assert_eq!(coerce_date("20201345"), None);
    }

    #[test]
    fn test_date_multibyte_is_none() {
        // Seven and eight bytes long with a multibyte char across byte 4.
        assert_eq!(coerce_date("2020é1"), None);
        assert_eq!(coerce_date("abcd€"), None);
        assert_eq!(coerce_date("2020é12"), None);
        assert_eq!(coerce_date("2020年1"), None);
        assert_eq!(coerce_date("2020-01-0€"), None);
        assert_eq!(coerce_date("2020-01-05é"), ymd(2020, 1, 5));
    }

    #[test]
    fn test_number_strips_noise() {
        assert_eq!(coerce_number("100"), Some(100.0));
        assert_eq!(coerce_number("102.5kg"), Some(102.5));
        assert_eq!(coerce_number(" 1,234.5 "), Some(1234.5));
        assert_eq!(coerce_number("-82.5"), Some(-82.5));
    }

    #[test]
    fn test_number_minus_only_when_leading() {
        assert_eq!(coerce_number("24-34"), Some(2434.0));
        assert_eq!(coerce_number("x-5"), Some(-5.0));
    }

    #[test]
    fn test_number_invalid_is_none() {
        for raw in ["", "-", ".", "-.", "bad", "1.2.3", "N/A"] {
            assert_eq!(coerce_number(raw), None, "input {:?}", raw);
        }
    }

    #[test]
    fn test_number_never_nan() {
        for raw in ["NaN", "inf", "-inf", "1e400", "..5", "0.0.0"] {
            if let Some(v) = coerce_number(raw) {
                assert!(v.is_finite(), "input {:?} gave {}", raw, v);
            }
        }
    }

    #[test]
    fn test_normalize_name_punctuation_and_case() {
        assert_eq!(normalize_name("O'Brien  Jr."), "obrien jr");
        assert_eq!(normalize_name("O'Brien  Jr."), normalize_name("obrien jr"));
        assert_eq!(normalize_name("  Jane\tDOE #1 "), "jane doe 1");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_normalize_name_idempotent() {
        for raw in ["O'Brien  Jr.", "José  Álvarez", "  ", "A-B c", "Ünïcode Näme"] {
            let once = normalize_name(raw);
            assert_eq!(normalize_name(&once), once);
        }
    }

    #[test]
    fn test_kg_to_lb_rounding() {
        assert_eq!(kg_to_lb(100.0), 220.46);
        assert_eq!(kg_to_lb(0.0), 0.0);
        assert_eq!(kg_to_lb(102.5), 225.97);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  \"Raw\" "), "Raw");
        assert_eq!(clean_text("\""), "\"");
        assert_eq!(clean_text(" USAPL "), "USAPL");
    }
}
