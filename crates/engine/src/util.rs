//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation logic so the engine enforces consistent invariants.

use chrono::{Datelike, NaiveDate};

use crate::{EngineError, ResultEngine};

pub(crate) const MIN_STATS_YEAR: i32 = 1900;
pub(crate) const MAX_STATS_YEAR: i32 = 2100;

/// Inclusive `[first day, last day]` window of a calendar month.
pub(crate) fn month_window(year: i32, month: u32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    if !(MIN_STATS_YEAR..=MAX_STATS_YEAR).contains(&year) {
        return Err(EngineError::InvalidRange(format!(
            "year {year} outside [{MIN_STATS_YEAR}, {MAX_STATS_YEAR}]"
        )));
    }
    if !(1..=12).contains(&month) {
        return Err(EngineError::InvalidRange(format!(
            "month {month} outside [1, 12]"
        )));
    }

    let invalid = || EngineError::InvalidRange(format!("invalid month {year}-{month:02}"));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;
    debug_assert_eq!(last.month(), month);
    Ok((first, last))
}

/// Trimmed, non-empty name or `InvalidName`.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Upper-cased three-letter ASCII code.
pub(crate) fn normalize_currency_code(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(EngineError::InvalidName(format!(
            "currency code '{trimmed}' must be 3 letters"
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// `#RRGGBB`, lower-cased.
pub(crate) fn normalize_color_hex(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let valid = trimmed.len() == 7
        && trimmed.starts_with('#')
        && trimmed[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(EngineError::InvalidName(format!(
            "color '{trimmed}' must look like #RRGGBB"
        )));
    }
    Ok(trimmed.to_ascii_lowercase())
}
