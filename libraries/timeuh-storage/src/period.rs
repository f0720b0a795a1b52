//! Half-open `[start, end)` local date-time ranges for calendar periods.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::StorageError;

pub(crate) type Bounds = (NaiveDateTime, NaiveDateTime);

fn first_of(year: i32, month: u32) -> Result<NaiveDate, StorageError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| StorageError::InvalidPeriod(format!("{:04}-{:02}", year, month)))
}

pub(crate) fn day(date: NaiveDate) -> Result<Bounds, StorageError> {
    let next = date
        .succ_opt()
        .ok_or_else(|| StorageError::InvalidPeriod(date.to_string()))?;
    Ok((date.and_time(chrono::NaiveTime::MIN), next.and_time(chrono::NaiveTime::MIN)))
}

pub(crate) fn month(year: i32, month: u32) -> Result<Bounds, StorageError> {
    let start = first_of(year, month)?;
    let end = if month == 12 {
        first_of(year + 1, 1)?
    } else {
        first_of(year, month + 1)?
    };
    Ok((start.and_time(chrono::NaiveTime::MIN), end.and_time(chrono::NaiveTime::MIN)))
}

pub(crate) fn year(year: i32) -> Result<Bounds, StorageError> {
    let start = first_of(year, 1)?;
    let end = first_of(year + 1, 1)?;
    Ok((start.and_time(chrono::NaiveTime::MIN), end.and_time(chrono::NaiveTime::MIN)))
}
