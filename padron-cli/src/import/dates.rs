//! Date normalization for spreadsheet cells
//!
//! Converts the date representations seen in uploaded rosters to canonical
//! `YYYY-MM-DD`. Unrecognized values are returned unchanged so the backend
//! can reject them with its own strict-ISO check.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("invalid ISO date regex")
});

static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").expect("invalid day-first regex")
});

static SERIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+(\.\d+)?$").expect("invalid serial regex")
});

static YEAR_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})[/-](\d{1,2})[/-](\d{1,2})$").expect("invalid year-first regex")
});

/// Normalize a date cell to `YYYY-MM-DD`
///
/// Empty cells normalize to the empty string (no date supplied). String
/// cells go through the pattern cascade; numeric cells are interpreted as
/// legacy spreadsheet serial dates.
pub fn normalize_date(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => normalize_date_str(s),
        Value::Number(n) => {
            let serial = n.as_f64().unwrap_or(0.0);
            serial_to_iso(serial).unwrap_or_else(|| number_to_string(serial))
        }
        other => other.to_string(),
    }
}

/// Normalize a date string to `YYYY-MM-DD`
///
/// Patterns are tried in priority order:
/// 1. `YYYY-MM-DD` passes through unchanged
/// 2. `D/M/YYYY` or `D-M-YYYY` (day-first) is reformatted with zero-padding
/// 3. A bare number is a spreadsheet serial date
/// 4. `YYYY/M/D` or `YYYY-M-D` is reformatted with zero-padding
pub fn normalize_date_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if ISO_DATE.is_match(trimmed) {
        return trimmed.to_string();
    }

    if let Some(caps) = DAY_FIRST.captures(trimmed) {
        if let (Some(day), Some(month), Some(year)) = (caps.get(1), caps.get(2), caps.get(3)) {
            return format_ymd(year.as_str(), month.as_str(), day.as_str())
                .unwrap_or_else(|| trimmed.to_string());
        }
    }

    if SERIAL.is_match(trimmed) {
        if let Ok(serial) = trimmed.parse::<f64>() {
            if let Some(iso) = serial_to_iso(serial) {
                return iso;
            }
        }
        return trimmed.to_string();
    }

    if let Some(caps) = YEAR_FIRST.captures(trimmed) {
        if let (Some(year), Some(month), Some(day)) = (caps.get(1), caps.get(2), caps.get(3)) {
            return format_ymd(year.as_str(), month.as_str(), day.as_str())
                .unwrap_or_else(|| trimmed.to_string());
        }
    }

    trimmed.to_string()
}

fn format_ymd(year: &str, month: &str, day: &str) -> Option<String> {
    let year: u32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    Some(format!("{:04}-{:02}-{:02}", year, month, day))
}

/// Convert a spreadsheet serial date to ISO
///
/// The epoch is anchored at 1899-12-30 rather than 1900-01-01, matching the
/// historical leap-year bug of the legacy spreadsheet format. Fractional
/// serials carry a time of day, which is discarded.
fn serial_to_iso(serial: f64) -> Option<String> {
    if serial <= 0.0 || !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::days(serial.trunc() as i64))?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn number_to_string(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
