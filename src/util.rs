// Parsing, rounding and percentage helpers.
//
// Both aggregators derive their percentages through `pct`, so the rounding
// and empty-group policy cannot drift between the monthly and actor views.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Forgiving numeric parse for spreadsheet cells: trims whitespace, strips
/// thousands separators, rejects anything containing letters. Returns `None`
/// for missing or unparseable values.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

// Day-first layouts take precedence over month-first for ambiguous slashed
// dates; month-first is tried once the day-first read fails.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%m/%d/%Y",
];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Parse a start-date cell, accepting the date and date-time layouts that
/// show up in helpdesk exports. `None` for anything else.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Arithmetic mean; 0 for an empty slice so group means never produce NaN.
pub fn average(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Round to one decimal place, half away from zero.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Round to the nearest whole number, half away from zero.
pub fn round0(x: f64) -> f64 {
    x.round()
}

/// Percentage of `part` out of `total`, rounded to one decimal. `None` when
/// `total` is zero or negative: an empty group has no defined percentage and
/// must not be reported as 0% or 100%.
pub fn pct(part: f64, total: f64) -> Option<f64> {
    if total <= 0.0 {
        return None;
    }
    Some(round1(part / total * 100.0))
}

/// Fixed-decimal formatting with locale thousands separators, e.g.
/// `1,234,567.89`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, n.abs());
    // Sign comes from the rounded digits so -0.4 at 0 decimals is "0", not "-0".
    let neg = n.is_sign_negative() && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Thousands-separated integer formatting for console diagnostics.
pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parse_f64_handles_garbage_and_separators() {
        assert_eq!(parse_f64_safe(Some("1,234.5")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("  7 ")), Some(7.0));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn parse_date_accepts_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date_safe(Some("2024-03-15")), Some(expected));
        assert_eq!(parse_date_safe(Some("2024-03-15 08:30:00")), Some(expected));
        assert_eq!(parse_date_safe(Some("15/03/2024")), Some(expected));
        assert_eq!(parse_date_safe(Some("2024-03-15T08:30:00")), Some(expected));
        // unambiguous month-first slashed dates fall through to %m/%d/%Y
        assert_eq!(parse_date_safe(Some("03/15/2024")), Some(expected));
        assert_eq!(parse_date_safe(Some("soon")), None);
        assert_eq!(parse_date_safe(None), None);
    }

    #[test]
    fn pct_is_bounded_and_undefined_on_empty() {
        assert_eq!(pct(1.0, 2.0), Some(50.0));
        assert_eq!(pct(0.0, 3.0), Some(0.0));
        assert_eq!(pct(3.0, 3.0), Some(100.0));
        assert_eq!(pct(1.0, 0.0), None);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round0(0.5), 1.0);
        assert_eq!(round0(1.5), 2.0);
        assert_eq!(round0(2.5), 3.0);
        assert_eq!(round0(-0.5), -1.0);
        assert_eq!(round1(2.25), 2.3);
        assert_eq!(round1(-2.25), -2.3);
        assert_eq!(pct(1.0, 3.0), Some(33.3));
    }

    #[test]
    fn average_of_empty_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn format_number_inserts_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.0, 1), "-42.0");
        assert_eq!(format_number(0.0, 2), "0.00");
        assert_eq!(format_number(-0.4, 0), "0");
        assert_eq!(format_number(-0.004, 2), "0.00");
    }
}
