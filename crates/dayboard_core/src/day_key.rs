//! Calendar-day watermark resolution.
//!
//! # Responsibility
//! - Map an instant to the calendar day it falls on in the fixed reset zone.
//! - Validate day-key text coming from storage or operators.
//!
//! # Invariants
//! - The reset zone is UTC+05:30 regardless of the process-local timezone.
//! - Day keys are `YYYY-MM-DD`, so lexicographic order is chronological order.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Offset of the reset zone east of UTC.
pub const RESET_ZONE_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

static DAY_KEY_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("day key pattern is a valid regex")
});

/// Calendar day in the reset zone, used as the reset watermark.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayKeyError {
    Malformed(String),
}

impl Display for DayKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => {
                write!(f, "invalid day key `{value}`; expected a YYYY-MM-DD date")
            }
        }
    }
}

impl Error for DayKeyError {}

impl DayKey {
    /// Resolves the day `instant` falls on in the reset zone.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        let local = instant.with_timezone(&reset_zone());
        Self(local.format(DAY_KEY_FORMAT).to_string())
    }

    /// Resolves the current day in the reset zone.
    pub fn today() -> Self {
        Self::from_instant(Utc::now())
    }

    /// Parses a `YYYY-MM-DD` key, rejecting impossible dates like `2024-02-30`.
    pub fn parse(value: &str) -> Result<Self, DayKeyError> {
        let trimmed = value.trim();
        if !DAY_KEY_SHAPE.is_match(trimmed) {
            return Err(DayKeyError::Malformed(trimmed.to_string()));
        }
        NaiveDate::parse_from_str(trimmed, DAY_KEY_FORMAT)
            .map_err(|_| DayKeyError::Malformed(trimmed.to_string()))?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NaiveDate> for DayKey {
    fn from(value: NaiveDate) -> Self {
        Self(value.format(DAY_KEY_FORMAT).to_string())
    }
}

fn reset_zone() -> FixedOffset {
    FixedOffset::east_opt(RESET_ZONE_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}
