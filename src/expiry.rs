// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Human-readable validity periods ("10y", "18m", "90d") resolved to days.

use crate::error::{Error, Result};
use chrono::{Days, Months, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound for both the magnitude and the resulting day count (about 30 years).
pub const MAX_EXPIRY_DAYS: u32 = 10957;

/// Splits a duration into its numeric magnitude and trailing unit.
static DURATION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)(.*)$").expect("invalid duration regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Years,
    Months,
    Days,
}

impl Unit {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "y" => Some(Unit::Years),
            "m" => Some(Unit::Months),
            "d" => Some(Unit::Days),
            _ => None,
        }
    }
}

/// Resolve a duration against today's date (UTC).
pub fn resolve(duration: &str) -> Result<u32> {
    resolve_from(duration, Utc::now().date_naive())
}

/// Resolve a duration against an explicit reference date.
///
/// The result is the number of calendar days between `today` and `today`
/// advanced by the requested amount, so "1y" is 366 days when the interval
/// spans a leap day. Month arithmetic clamps to the end of shorter months.
///
/// # Errors
/// Returns [`Error::InvalidExpiry`] carrying the offending token when the
/// magnitude is missing or out of `[1, MAX_EXPIRY_DAYS]`, the unit is not one
/// of `y`, `m`, `d`, or the computed day count falls outside the same range.
pub fn resolve_from(duration: &str, today: NaiveDate) -> Result<u32> {
    let invalid = || Error::InvalidExpiry(duration.to_string());

    let caps = DURATION_REGEX.captures(duration.trim()).ok_or_else(invalid)?;
    let magnitude: u32 = caps[1].parse().map_err(|_| invalid())?;
    if magnitude == 0 || magnitude > MAX_EXPIRY_DAYS {
        return Err(invalid());
    }
    let unit = Unit::parse(&caps[2]).ok_or_else(invalid)?;

    let end = match unit {
        Unit::Years => today.checked_add_months(Months::new(magnitude * 12)),
        Unit::Months => today.checked_add_months(Months::new(magnitude)),
        Unit::Days => today.checked_add_days(Days::new(u64::from(magnitude))),
    }
    .ok_or_else(invalid)?;

    let days = (end - today).num_days();
    if days < 1 || days > i64::from(MAX_EXPIRY_DAYS) {
        return Err(invalid());
    }
    Ok(days as u32)
}
