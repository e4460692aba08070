//! Integer-encoded calendar dates (`YYYYMMDD`).
//!
//! Notes store their day as a plain integer, e.g. `20250401`. The helpers
//! here decode, validate and format that value.

use chrono::{Datelike, Local, NaiveDate};

/// Splits an encoded date into `(year, month, day)` without validating it.
pub fn date_parts(value: i32) -> (i32, i32, i32) {
    (value / 10000, (value / 100) % 100, value % 100)
}

/// Returns whether `value` decodes to a real Gregorian calendar day.
///
/// Zero year, month or day is invalid. Leap years follow the 400/100/4 rule.
pub fn is_valid_date(value: i32) -> bool {
    let (year, month, day) = date_parts(value);
    if year == 0 || month == 0 || day == 0 {
        return false;
    }
    if !(1..=12).contains(&month) || day < 1 {
        return false;
    }
    NaiveDate::from_ymd_opt(year, month as u32, day as u32).is_some()
}

/// Formats an encoded date as `YYYY-MM-DD`.
///
/// Invalid values are formatted field by field so an in-progress edit can
/// still be echoed back to the user.
pub fn format_date(value: i32) -> String {
    let (year, month, day) = date_parts(value);
    format!("{year:04}-{month:02}-{day:02}")
}

/// Parses date field input such as `2025-04-01` or `20250401`.
///
/// Dashes are ignored. Returns `None` for non-numeric or invalid days.
pub fn parse_date_input(input: &str) -> Option<i32> {
    let digits: String = input.trim().chars().filter(|c| *c != '-').collect();
    let value = digits.parse::<i32>().ok()?;
    is_valid_date(value).then_some(value)
}

/// Encodes a calendar day.
pub fn encode_date(date: NaiveDate) -> i32 {
    date.year() * 10000 + date.month() as i32 * 100 + date.day() as i32
}

/// Decodes an encoded date, returning `None` for invalid values.
pub fn decode_date(value: i32) -> Option<NaiveDate> {
    if !is_valid_date(value) {
        return None;
    }
    let (year, month, day) = date_parts(value);
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Returns the local calendar day in encoded form.
pub fn today() -> i32 {
    encode_date(Local::now().date_naive())
}
