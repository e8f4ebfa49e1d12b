//! Date-key normalization for archive rows.
//!
//! Archive partitions key their rows on canonical `YYYY-MM-DD` strings,
//! but the date column of older partitions has been written by more than
//! one tool over the years: text keys, locale strings, even spreadsheet
//! serial numbers survive. [`normalize`] folds all of them into one key
//! and answers `None` for anything that is not a date, so callers can
//! skip bad values instead of aborting a run.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Canonical date-key shape.
static DATE_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Serial 0 in the spreadsheet date system.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Upper bound on accepted serials (around the year 2447); anything past
/// this is treated as a plain number, not a date.
const SERIAL_MAX: f64 = 200_000.0;

/// Text formats tried for non-canonical date strings, datetime first.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

/// A date as it may appear in a stored row.
#[derive(Debug, Clone, PartialEq)]
pub enum DateValue {
    /// A native calendar date.
    Date(NaiveDate),
    /// Free-form text, canonical or otherwise.
    Text(String),
    /// A spreadsheet serial number (days since 1899-12-30), possibly with
    /// a fractional time of day.
    Serial(f64),
}

/// Canonicalize a date value into a `YYYY-MM-DD` key.
///
/// Returns `None` when the value cannot be read as a date; callers treat
/// that as "exclude this value", never as an error.
pub fn normalize(value: &DateValue) -> Option<String> {
    match value {
        DateValue::Date(date) => Some(format_key(*date)),
        DateValue::Text(text) => normalize_text(text),
        DateValue::Serial(serial) => serial_to_date(*serial).map(format_key),
    }
}

/// Format a calendar date as a canonical key.
pub fn format_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Whether `text` already has the canonical `YYYY-MM-DD` shape.
pub fn is_date_key(text: &str) -> bool {
    DATE_KEY_REGEX.is_match(text)
}

fn normalize_text(text: &str) -> Option<String> {
    let text = text.trim();

    // Already canonical: hand it back untouched.
    if DATE_KEY_REGEX.is_match(text) {
        return Some(text.to_string());
    }

    parse_loose(text).map(format_key)
}

fn parse_loose(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    None
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > SERIAL_MAX {
        return None;
    }

    let (year, month, day) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}
