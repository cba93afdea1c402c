//! Pure cell-value normalizers. Every function is total over its input:
//! unparseable data degrades to `None`, never an error.

use chrono::{Duration, NaiveDate};

/// Canonical numeric range parsed from free-text spreadsheet cells.
///
/// `min == max` encodes an exact value; a single-sided bound leaves the other
/// end `None`. Both ends are `None` only when the source was unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericRange {
    pub const fn exact(value: f64) -> Self {
        Self {
            min: Some(value),
            max: Some(value),
        }
    }
}

/// Normalize a Korean phone number to the canonical dashed format.
///
/// Handles the `82` country prefix, mobile numbers missing their leading
/// zero, `010` mobiles and `02` Seoul landlines. Anything else keeps its
/// digits unformatted. Digit-free input yields `None`.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    if digits.len() == 12 && digits.starts_with("82") {
        digits = format!("0{}", &digits[2..]);
    }
    if digits.len() == 10 && digits.starts_with("10") {
        digits = format!("0{digits}");
    }

    if digits.len() == 11 && digits.starts_with("010") {
        return Some(format!(
            "{}-{}-{}",
            &digits[..3],
            &digits[3..7],
            &digits[7..]
        ));
    }
    if digits.len() == 10 && digits.starts_with("02") {
        return Some(format!(
            "{}-{}-{}",
            &digits[..2],
            &digits[2..6],
            &digits[6..]
        ));
    }

    Some(digits)
}

/// Parse a single number out of free text, tolerating the `억` unit suffix
/// and `A~B` range notation (the lower bound wins).
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some((low, _)) = trimmed.split_once('~') {
        return leading_number(low);
    }
    leading_number(trimmed)
}

/// Parse free text into a [`NumericRange`].
///
/// Recognized shapes: `A~B`, `N미만`/`N이하` (upper bound only),
/// `N이상`/`N초과` (lower bound only), bare or unit-suffixed `N`. The
/// strict/non-strict pairs are deliberately conflated to match the upstream
/// data contract; see the open-question test below.
pub fn parse_number_range(raw: &str) -> NumericRange {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NumericRange::default();
    }

    if let Some((low, high)) = trimmed.split_once('~') {
        return NumericRange {
            min: leading_number(low),
            max: leading_number(high),
        };
    }

    if trimmed.contains("미만") || trimmed.contains("이하") {
        return NumericRange {
            min: None,
            max: leading_number(trimmed),
        };
    }

    if trimmed.contains("이상") || trimmed.contains("초과") {
        return NumericRange {
            min: leading_number(trimmed),
            max: None,
        };
    }

    match leading_number(trimmed) {
        Some(value) => NumericRange::exact(value),
        None => NumericRange::default(),
    }
}

/// Parse a date cell: ISO datetime/date strings first, then the Korean
/// `YYYY년 M월 D일` pattern.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    korean_date(trimmed)
}

/// Convert a spreadsheet date serial (days since 1899-12-30) to a date.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial <= 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

fn korean_date(text: &str) -> Option<NaiveDate> {
    let (year, rest) = text.split_once('년')?;
    let (month, rest) = rest.split_once('월')?;
    let (day, _) = rest.split_once('일')?;

    let year: i32 = year.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let day: u32 = day.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Extract the first signed/decimal numeric token from a string.
fn leading_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut start = None;
    for (index, byte) in bytes.iter().enumerate() {
        if byte.is_ascii_digit() {
            start = Some(index);
            break;
        }
    }
    let mut start = start?;

    // Pull in a sign glued to the digits.
    if start > 0 && bytes[start - 1] == b'-' {
        start -= 1;
    }

    let mut end = start;
    let mut seen_dot = false;
    for (offset, byte) in bytes[start..].iter().enumerate() {
        match byte {
            b'0'..=b'9' => end = start + offset + 1,
            b'-' if offset == 0 => end = start + offset + 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end = start + offset + 1;
            }
            _ => break,
        }
    }

    text[start..end].trim_end_matches('.').parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_formats_mobile_and_seoul_numbers() {
        assert_eq!(
            normalize_phone("010-1234-5678").as_deref(),
            Some("010-1234-5678")
        );
        assert_eq!(
            normalize_phone("01012345678").as_deref(),
            Some("010-1234-5678")
        );
        assert_eq!(
            normalize_phone("0212345678").as_deref(),
            Some("02-1234-5678")
        );
    }

    #[test]
    fn phone_restores_country_code_and_missing_zero() {
        // +82 10-1234-5678 exported without the plus sign.
        assert_eq!(
            normalize_phone("821012345678").as_deref(),
            Some("010-1234-5678")
        );
        // Mobile number exported without its leading zero.
        assert_eq!(
            normalize_phone("1012345678").as_deref(),
            Some("010-1234-5678")
        );
    }

    #[test]
    fn phone_passes_through_unrecognized_lengths() {
        assert_eq!(normalize_phone("03112345678").as_deref(), Some("03112345678"));
        assert_eq!(normalize_phone("12345").as_deref(), Some("12345"));
    }

    #[test]
    fn phone_rejects_digit_free_input() {
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("상담원 문의"), None);
    }

    #[test]
    fn phone_normalization_is_idempotent() {
        for raw in ["01012345678", "821012345678", "0212345678", "12345"] {
            let once = normalize_phone(raw).expect("normalizes");
            let twice = normalize_phone(&once).expect("re-normalizes");
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn number_strips_units_and_takes_range_lower_bound() {
        assert_eq!(parse_number("15"), Some(15.0));
        assert_eq!(parse_number("10억"), Some(10.0));
        assert_eq!(parse_number("10억~30억"), Some(10.0));
        assert_eq!(parse_number("약 3.5억 규모"), Some(3.5));
        assert_eq!(parse_number("미정"), None);
    }

    #[test]
    fn range_parses_exact_ranges_with_unit_suffixes() {
        let range = parse_number_range("10억~30억_미만");
        assert_eq!(range.min, Some(10.0));
        assert_eq!(range.max, Some(30.0));

        let range = parse_number_range("5명~10명");
        assert_eq!(range.min, Some(5.0));
        assert_eq!(range.max, Some(10.0));
    }

    #[test]
    fn range_parses_single_sided_bounds() {
        assert_eq!(
            parse_number_range("30억_미만"),
            NumericRange {
                min: None,
                max: Some(30.0)
            }
        );
        assert_eq!(
            parse_number_range("10억_이상"),
            NumericRange {
                min: Some(10.0),
                max: None
            }
        );
    }

    // Open question: the upstream data contract treats 미만 (strict) the same
    // as 이하 (inclusive), and 이상 like 초과. Preserved as-is until product
    // clarifies; these assertions pin the conflated behavior.
    #[test]
    fn range_conflates_strict_and_inclusive_bounds() {
        assert_eq!(parse_number_range("30억_미만"), parse_number_range("30억_이하"));
        assert_eq!(parse_number_range("10억_이상"), parse_number_range("10억_초과"));
    }

    #[test]
    fn range_treats_bare_numbers_as_exact() {
        assert_eq!(parse_number_range("50"), NumericRange::exact(50.0));
        assert_eq!(parse_number_range("50명"), NumericRange::exact(50.0));
        assert_eq!(parse_number_range("매출 120억 수준"), NumericRange::exact(120.0));
    }

    #[test]
    fn range_never_fails_on_garbage() {
        for raw in ["", "   ", "비공개", "~", "억"] {
            let range = parse_number_range(raw);
            assert_eq!(range, NumericRange::default(), "input {raw:?}");
        }
    }

    #[test]
    fn negative_and_decimal_tokens_survive_extraction() {
        assert_eq!(parse_number("-2.5억"), Some(-2.5));
        assert_eq!(parse_number_range("-5~5"), NumericRange {
            min: Some(-5.0),
            max: Some(5.0)
        });
    }

    #[test]
    fn date_accepts_iso_and_korean_patterns() {
        assert_eq!(
            parse_date("2025-03-01"),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert_eq!(
            parse_date("2025-03-01T09:30:00Z"),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert_eq!(
            parse_date("2025년 3월 1일"),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert_eq!(parse_date("어제"), None);
    }

    #[test]
    fn date_serial_matches_spreadsheet_epoch() {
        // 45658 is 2025-01-01 in the 1900 date system.
        assert_eq!(date_from_serial(45658.0), NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(date_from_serial(0.0), None);
        assert_eq!(date_from_serial(-3.0), None);
    }
}
