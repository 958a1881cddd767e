use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::domain::{DomainError, DomainResult};

/// Earliest calendar year a channel may be scheduled for.
pub const MIN_SCHEDULE_YEAR: i32 = 2023;

static TIME_24H_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("valid time pattern"));

/// Optional time window attached to a channel.
///
/// `time` is a 24-hour `HH:MM` string, `date` a canonical `MM/DD/YYYY`
/// string; either may be absent independently of the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelSchedule {
    pub time: Option<String>,
    pub date: Option<String>,
}

impl ChannelSchedule {
    pub fn is_empty(&self) -> bool {
        self.time.is_none() && self.date.is_none()
    }
}

/// Validate a 24-hour `HH:MM` timeout string.
pub fn validate_time(time: &str) -> DomainResult<()> {
    if TIME_24H_PATTERN.is_match(time) {
        Ok(())
    } else {
        Err(DomainError::InvalidTimeFormat(time.to_string()))
    }
}

/// Parse an `MM/DD/YYYY` calendar date and return its canonical
/// zero-padded form. Rejects impossible dates and any year before
/// [`MIN_SCHEDULE_YEAR`].
pub fn parse_date(date: &str) -> DomainResult<String> {
    let parsed = NaiveDate::parse_from_str(date, "%m/%d/%Y")
        .map_err(|_| DomainError::InvalidDateFormat(date.to_string()))?;

    if parsed.year() < MIN_SCHEDULE_YEAR {
        return Err(DomainError::InvalidDateFormat(date.to_string()));
    }

    Ok(parsed.format("%m/%d/%Y").to_string())
}
