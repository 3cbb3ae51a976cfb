//! Year assignment for collection dates.

use chrono::{Datelike, NaiveDate};

use binday_core::CollectionRecord;

use crate::error::CalendarError;

const DATE_FORMAT: &str = "%d %B %Y";

/// Resolve a record's day and month to the next matching date on or after `today`.
///
/// The year is `today`'s; dates that would already be in the past roll over
/// into the following year.
///
/// # Errors
///
/// Returns [`CalendarError::MissingMonth`] for records without a month and
/// [`CalendarError::InvalidDate`] when the day/month pair cannot be parsed.
pub fn resolve_collection_date(
    record: &CollectionRecord,
    today: NaiveDate,
) -> Result<NaiveDate, CalendarError> {
    let month = record.month_name.trim();
    if month.is_empty() {
        return Err(CalendarError::MissingMonth);
    }

    let invalid = || CalendarError::InvalidDate {
        day_and_weekday: record.day_and_weekday.clone(),
        month_name: record.month_name.clone(),
    };
    let day = record
        .day_and_weekday
        .split_whitespace()
        .next()
        .ok_or_else(invalid)?;

    let in_year =
        |year: i32| NaiveDate::parse_from_str(&format!("{day} {month} {year}"), DATE_FORMAT).ok();

    match in_year(today.year()) {
        Some(date) if date >= today => Ok(date),
        _ => in_year(today.year() + 1).ok_or_else(invalid),
    }
}
