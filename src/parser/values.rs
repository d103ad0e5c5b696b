//! Converters from the portal's localized value formats into canonical units.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::America::Santiago;
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;

const OCDS_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const PORTAL_DATETIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";
const PORTAL_DATE_FORMAT: &str = "%d-%m-%Y";
const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

static SIZE_REGEX: OnceLock<Regex> = OnceLock::new();

fn size_regex() -> &'static Regex {
    SIZE_REGEX.get_or_init(|| {
        Regex::new(r"(\d+)\s*(Kb|Mb)").expect("size pattern is a valid regex")
    })
}

/// Converts an attachment size label (`"1024 Kb"`, `"3 Mb"`) into bytes.
///
/// # Errors
///
/// Returns `ValueFormat` with `Invalid size format: {text}` when no number/unit
/// pair is present.
pub fn parse_size(text: &str) -> AppResult<u64> {
    let invalid = || AppError::ValueFormat(format!("Invalid size format: {}", text.trim()));

    let captures = size_regex().captures(text).ok_or_else(invalid)?;
    let value: u64 = captures[1].parse().map_err(|_| invalid())?;
    let multiplier = match &captures[2] {
        "Kb" => 1024,
        _ => 1024 * 1024,
    };

    value.checked_mul(multiplier).ok_or_else(invalid)
}

/// Converts a peso amount (`"$ 7.613.726"`, `"-$ 1.234"`) into an integer.
///
/// Dots are thousands separators. Empty input or anything besides digits after
/// stripping the sign, currency symbol and separators is an error.
pub fn parse_amount(text: &str) -> AppResult<i64> {
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let digits: String = rest
        .chars()
        .filter(|c| !matches!(c, '$' | '.') && !c.is_whitespace())
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::ValueFormat(format!("Invalid amount: '{trimmed}'")));
    }

    let value: i64 = digits
        .parse()
        .map_err(|_| AppError::ValueFormat(format!("Invalid amount: '{trimmed}'")))?;

    Ok(if negative { -value } else { value })
}

/// Attaches the Santiago zone to a wall-clock time.
///
/// During the autumn DST fold the earlier instant wins; times inside the spring
/// gap do not exist and are rejected.
pub fn localize(naive: NaiveDateTime) -> AppResult<DateTime<Tz>> {
    Santiago
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| {
            AppError::ValueFormat(format!("{naive} does not exist in America/Santiago"))
        })
}

/// Parses an OCDS timestamp (`2024-10-04T15:25:56Z`).
///
/// The portal writes Santiago wall-clock time followed by a literal `Z`, so the
/// value is re-interpreted in Santiago rather than converted from UTC.
pub fn parse_ocds_datetime(text: &str) -> AppResult<DateTime<Tz>> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), OCDS_DATETIME_FORMAT).map_err(|e| {
        AppError::ValueFormat(format!(
            "time data '{}' does not match format '{OCDS_DATETIME_FORMAT}': {e}",
            text.trim()
        ))
    })?;
    localize(naive)
}

/// Parses a page timestamp (`16-12-2024 12:00:00`) in Santiago time.
pub fn parse_portal_datetime(text: &str) -> AppResult<DateTime<Tz>> {
    let naive =
        NaiveDateTime::parse_from_str(text.trim(), PORTAL_DATETIME_FORMAT).map_err(|e| {
            AppError::ValueFormat(format!(
                "time data '{}' does not match format '{PORTAL_DATETIME_FORMAT}': {e}",
                text.trim()
            ))
        })?;
    localize(naive)
}

/// Parses a page date in ISO (`2024-12-16`) or Chilean (`16-12-2024`) order.
pub fn parse_portal_date(text: &str) -> AppResult<NaiveDate> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, PORTAL_DATE_FORMAT))
        .map_err(|_| {
            AppError::ValueFormat(format!(
                "The date string '{trimmed}' does not match ISO (YYYY-MM-DD) or dd-mm-yyyy formats."
            ))
        })
}

/// Parses a user supplied `YYYY-MM-DD` date.
pub fn parse_iso_date(text: &str) -> AppResult<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Date cannot be empty".into()));
    }
    NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT).map_err(|_| {
        AppError::InvalidInput(format!(
            "Invalid date format: {trimmed}. Expected format is YYYY-MM-DD."
        ))
    })
}
