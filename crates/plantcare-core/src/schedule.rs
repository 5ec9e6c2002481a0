//! Watering schedule arithmetic.
//!
//! All computations work on calendar dates ([`NaiveDate`]); there is no
//! time-of-day component anywhere in the schedule.

use std::fmt;

use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire format for every date plantcare reads or writes.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors produced by schedule computations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("watering frequency must be a positive number of days, got {0}")]
    InvalidFrequency(i32),

    #[error("next watering date is out of range: {last_watered} + {frequency} days")]
    OutOfRange {
        last_watered: NaiveDate,
        frequency: i32,
    },
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, ScheduleError> {
    let trimmed = input.trim();
    // chrono accepts signs and unpadded fields; the wire format does not.
    if !is_iso_shape(trimmed.as_bytes()) {
        return Err(ScheduleError::InvalidDate(input.to_owned()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ScheduleError::InvalidDate(input.to_owned()))
}

/// `DDDD-DD-DD` with ASCII digits.
fn is_iso_shape(raw: &[u8]) -> bool {
    raw.len() == 10
        && raw.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Add `frequency` calendar days to `last_watered`.
pub fn compute_next_watering(
    last_watered: NaiveDate,
    frequency: i32,
) -> Result<NaiveDate, ScheduleError> {
    let days = u64::try_from(frequency)
        .ok()
        .filter(|d| *d > 0)
        .ok_or(ScheduleError::InvalidFrequency(frequency))?;

    last_watered
        .checked_add_days(Days::new(days))
        .ok_or(ScheduleError::OutOfRange {
            last_watered,
            frequency,
        })
}

/// Where a plant stands relative to its next watering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WateringStatus {
    Overdue {
        #[serde(rename = "daysLate")]
        days_late: i64,
    },
    DueToday,
    Upcoming {
        #[serde(rename = "daysRemaining")]
        days_remaining: i64,
    },
}

impl WateringStatus {
    /// True for statuses that call for watering now.
    pub fn needs_water(&self) -> bool {
        !matches!(self, Self::Upcoming { .. })
    }

    /// Human-facing reminder text for a plant scheduled on `next_watering`.
    pub fn message(&self, next_watering: NaiveDate) -> String {
        match self {
            Self::DueToday => "Water me today!".to_owned(),
            Self::Upcoming { days_remaining } => format!(
                "Next water in {days_remaining} day(s) on {}.",
                next_watering.format(DATE_FORMAT)
            ),
            Self::Overdue { .. } => format!(
                "You missed watering! Last reminder was for {}.",
                next_watering.format(DATE_FORMAT)
            ),
        }
    }
}

impl fmt::Display for WateringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overdue { days_late } => write!(f, "overdue by {days_late} day(s)"),
            Self::DueToday => f.write_str("due today"),
            Self::Upcoming { days_remaining } => write!(f, "due in {days_remaining} day(s)"),
        }
    }
}

/// Classify `next_watering` against `today` at day granularity.
pub fn classify_status(next_watering: NaiveDate, today: NaiveDate) -> WateringStatus {
    let days = next_watering.signed_duration_since(today).num_days();
    match days {
        0 => WateringStatus::DueToday,
        d if d > 0 => WateringStatus::Upcoming { days_remaining: d },
        d => WateringStatus::Overdue { days_late: -d },
    }
}

/// Classify against a timestamp; the time of day is discarded first.
pub fn classify_status_at(next_watering: NaiveDate, now: NaiveDateTime) -> WateringStatus {
    classify_status(next_watering, now.date())
}
