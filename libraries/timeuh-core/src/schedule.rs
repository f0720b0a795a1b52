//! Start-time resolution for feed entries.
//!
//! The feed only carries the wall-clock time a track started at. A time late
//! in the evening seen shortly after midnight belongs to the previous day.

use chrono::{NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{Result, TimeuhError};

/// Tracks starting after this hour may belong to yesterday
const LATE_EVENING_HOUR: u32 = 20;

/// ...when polled before this hour
const EARLY_MORNING_HOUR: u32 = 2;

/// Parse a feed clock value (`HH:MM:SS` or `HH:MM`)
pub fn parse_clock(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| TimeuhError::bad_response(format!("Unreadable track time '{}'", raw)))
}

/// Date a feed clock value relative to the station's current local time
pub fn resolve_started_at(clock: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let mut date = now.date();
    if clock.hour() > LATE_EVENING_HOUR && now.hour() < EARLY_MORNING_HOUR {
        date = date.pred_opt().unwrap_or(date);
    }
    date.and_time(clock)
}

/// Current wall-clock time of the station, to the second
pub fn station_now(timezone: Tz) -> NaiveDateTime {
    let now = Utc::now().with_timezone(&timezone).naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
